//! wgpu render backend for the demo.
//!
//! Draws a textured floor plane, a fixed set of cubes, the physics sphere
//! and a skybox under a fly camera.
//!
//! # Invariants
//! - Meshes and textures are uploaded once, in [`SceneRenderer::new`].
//! - The renderer only reads the frame description; it never owns scene state.
//! - The skybox is drawn last, at depth 1.0, so it only fills empty pixels.

mod camera;
mod gpu;
pub mod mesh;
mod shaders;
mod texture;

pub use camera::FlyCamera;
pub use gpu::{FrameScene, SceneRenderer, SceneTextures};
pub use mesh::{GpuMesh, MeshData, Vertex};
pub use texture::GpuTexture;

pub fn crate_info() -> &'static str {
    "heavens-render-wgpu v0.1.0"
}
