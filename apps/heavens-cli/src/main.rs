use anyhow::bail;
use clap::{Parser, Subcommand};
use heavens_assets::{
    AssetPaths, CONTAINER_TEXTURE, CubemapFaces, OVERLAY_TEXTURE, SKYBOX_DIR, SKYBOX_EXTENSION,
    TextureOptions, load_cubemap, load_texture,
};
use heavens_physics::{BouncingSphere, PhysicsSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Seconds of simulated time between printed samples.
const SAMPLE_INTERVAL: f32 = 0.1;

#[derive(Parser)]
#[command(name = "heavens-cli", about = "Headless tooling for the Grey Heavens demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load every demo texture and the skybox, reporting what fails
    CheckAssets {
        /// Asset root (defaults to `assets/` next to the executable)
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Run the bouncing-sphere scene without a window
    Simulate {
        /// Simulated seconds
        #[arg(short, long, default_value = "5")]
        seconds: f32,
        /// Physics steps per second
        #[arg(long, default_value = "60")]
        hz: u32,
    },
}

/// Sphere state at one point in simulated time.
#[derive(Debug, Clone, Copy)]
struct Sample {
    time: f32,
    height: f32,
    vertical_velocity: f32,
}

/// Step the demo at `hz` for `seconds`, sampling every [`SAMPLE_INTERVAL`].
fn simulate(seconds: f32, hz: u32) -> (BouncingSphere, Vec<Sample>) {
    let hz = hz.max(1);
    let settings = PhysicsSettings {
        timestep: 1.0 / hz as f32,
        ..PhysicsSettings::default()
    };
    let mut demo = BouncingSphere::new(settings);
    tracing::debug!("simulating {seconds}s at {hz} Hz");

    let total_steps = (seconds.max(0.0) * hz as f32).round() as u32;
    let steps_per_sample = ((SAMPLE_INTERVAL * hz as f32).round() as u32).max(1);

    let mut samples = Vec::new();
    for step in 1..=total_steps {
        demo.advance(settings.timestep);
        if step % steps_per_sample == 0 {
            let t = demo.sphere_transform();
            samples.push(Sample {
                time: step as f32 / hz as f32,
                height: t.position.y,
                vertical_velocity: demo.sphere_velocity().y,
            });
        }
    }
    (demo, samples)
}

/// Try every asset the desktop demo loads. Returns how many failed.
fn check_assets(paths: &AssetPaths) -> usize {
    let opts = TextureOptions::default();
    let mut failures = 0;

    for name in [CONTAINER_TEXTURE, OVERLAY_TEXTURE] {
        let path = paths.texture(name);
        match load_texture(&path, &opts) {
            Ok(tex) => println!(
                "ok    {}  {}x{} {:?}, {} mips",
                path.display(),
                tex.width,
                tex.height,
                tex.format,
                tex.mip_count()
            ),
            Err(e) => {
                tracing::warn!("texture failed to load: {e}");
                println!("FAIL  {}: {e}", path.display());
                failures += 1;
            }
        }
    }

    let dir = paths.cubemap_dir(SKYBOX_DIR);
    match load_cubemap(&CubemapFaces::in_dir(&dir, SKYBOX_EXTENSION)) {
        Ok(cube) => println!("ok    {}  6 faces, {}x{}", dir.display(), cube.size, cube.size),
        Err(e) => {
            tracing::warn!("skybox failed to load: {e}");
            println!("FAIL  {}: {e}", dir.display());
            failures += 1;
        }
    }

    failures
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("heavens-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", heavens_common::crate_info());
            println!("assets: {}", heavens_assets::crate_info());
            println!("input: {}", heavens_input::crate_info());
            println!("physics: {}", heavens_physics::crate_info());
            println!("render: {}", heavens_render_wgpu::crate_info());
        }
        Commands::CheckAssets { assets } => {
            let paths = AssetPaths::discover(assets);
            println!("asset root: {}", paths.root().display());
            let failures = check_assets(&paths);
            if failures > 0 {
                bail!("{failures} asset(s) failed to load");
            }
            println!("all assets loaded");
        }
        Commands::Simulate { seconds, hz } => {
            println!("Simulating {seconds}s at {hz} Hz");
            let (demo, samples) = simulate(seconds, hz);
            for s in &samples {
                println!(
                    "t={:>6.2}s  height={:>7.3}  vy={:>7.3}",
                    s.time, s.height, s.vertical_velocity
                );
            }
            let contacts = demo.world().contact_stats();
            println!(
                "{} steps, {} contacts started, {} touching",
                demo.world().step_count(),
                contacts.started,
                contacts.touching()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use heavens_common::scene::SPHERE_RADIUS;

    #[test]
    fn simulate_samples_every_tenth_of_a_second() {
        let (demo, samples) = simulate(2.0, 60);
        assert_eq!(samples.len(), 20);
        assert!((samples[0].time - 0.1).abs() < 1e-6);
        assert!((samples[19].time - 2.0).abs() < 1e-6);
        assert_eq!(demo.world().step_count(), 120);
    }

    #[test]
    fn simulated_sphere_lands_on_floor() {
        let (demo, samples) = simulate(3.0, 120);
        assert!(demo.world().contact_stats().started >= 1);
        for s in &samples {
            // Never sinks meaningfully through the floor.
            assert!(s.height > SPHERE_RADIUS - 0.1, "sphere at {}", s.height);
        }
    }

    #[test]
    fn simulate_with_zero_time_takes_no_steps() {
        let (demo, samples) = simulate(0.0, 60);
        assert!(samples.is_empty());
        assert_eq!(demo.world().step_count(), 0);
    }

    #[test]
    fn check_assets_counts_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AssetPaths::new(dir.path());
        // Two textures and the cubemap.
        assert_eq!(check_assets(&paths), 3);
    }
}
