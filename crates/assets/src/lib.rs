//! CPU-side asset loading for the demo: textures and the skybox cubemap.
//!
//! Everything here stops at decoded pixels. Uploading to the GPU is the
//! render crate's job, so this crate can be exercised without a device.
//!
//! # Layout
//! Assets live under a single root (see [`AssetPaths`]):
//! `textures/*.png` for surfaces and `textures/skybox/{right,left,...}.jpg`
//! for the environment.

mod cubemap;
mod error;
mod paths;
mod texture;

pub use cubemap::{
    CUBE_FACE_NAMES, CubemapFaces, CubemapImage, load_cubemap, load_cubemap_or_fallback,
};
pub use error::AssetError;
pub use paths::{AssetPaths, CONTAINER_TEXTURE, OVERLAY_TEXTURE, SKYBOX_DIR, SKYBOX_EXTENSION};
pub use texture::{
    PixelFormat, TextureImage, TextureOptions, decode_texture, load_texture,
    load_texture_or_fallback, mip_level_count,
};

pub fn crate_info() -> &'static str {
    "heavens-assets v0.1.0"
}
