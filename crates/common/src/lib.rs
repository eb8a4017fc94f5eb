//! Shared types for the Grey Heavens demo.
//!
//! Physics and rendering agree on the scene through the constants in
//! [`scene`]; neither crate hard-codes positions of its own.

pub mod scene;
pub mod types;

pub use types::Transform;

pub fn crate_info() -> &'static str {
    "heavens-common v0.1.0"
}
