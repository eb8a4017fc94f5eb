//! Input: raw keys become [`Action`]s, and held actions become movement.
//!
//! # Invariants
//! - Nothing downstream of this crate looks at key codes.
//! - Opposite movement actions cancel instead of one winning.

pub mod action;
pub mod state;

pub use action::{Action, Bindings};
pub use state::ActionState;

pub fn crate_info() -> &'static str {
    "heavens-input v0.1.0"
}
