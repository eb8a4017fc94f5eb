use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for Grey Heavens")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Launch the desktop demo; extra arguments are passed through
    Run {
        /// Build with optimizations
        #[arg(long)]
        release: bool,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_doc()?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Doc => run_doc()?,
        Commands::Build => run_build()?,
        Commands::Run { release, args } => run_desktop(release, &args)?,
    }

    Ok(())
}

fn cargo(args: &[&str], what: &str) -> Result<()> {
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    println!("==> Running cargo fmt --check");
    cargo(&["fmt", "--all", "--", "--check"], "cargo fmt check")
}

fn run_clippy() -> Result<()> {
    println!("==> Running cargo clippy");
    cargo(
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
        "cargo clippy",
    )
}

fn run_tests() -> Result<()> {
    println!("==> Running cargo test");
    cargo(&["test", "--workspace"], "cargo test")
}

fn run_doc() -> Result<()> {
    println!("==> Running cargo doc");
    cargo(&["doc", "--workspace", "--no-deps"], "cargo doc")
}

fn run_build() -> Result<()> {
    println!("==> Running cargo build");
    cargo(&["build", "--workspace"], "cargo build")
}

fn run_desktop(release: bool, extra: &[String]) -> Result<()> {
    println!("==> Running heavens-desktop");
    let mut args = vec!["run", "-p", "heavens-desktop"];
    if release {
        args.push("--release");
    }
    if !extra.is_empty() {
        args.push("--");
        args.extend(extra.iter().map(String::as_str));
    }
    cargo(&args, "heavens-desktop")
}
