use std::path::{Path, PathBuf};

/// Container crate texture, the primary surface texture.
pub const CONTAINER_TEXTURE: &str = "textures/container2.png";
/// Decal blended over the floor.
pub const OVERLAY_TEXTURE: &str = "textures/reimu_timbersaw.png";
/// Directory holding the six skybox faces.
pub const SKYBOX_DIR: &str = "textures/skybox";
pub const SKYBOX_EXTENSION: &str = "jpg";

/// Resolves asset-relative names against one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    root: PathBuf,
}

impl AssetPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pick the asset root.
    ///
    /// An explicit override wins unconditionally. Otherwise `assets/` next to
    /// the executable is used when it exists, falling back to `./assets`.
    pub fn discover(override_root: Option<PathBuf>) -> Self {
        if let Some(root) = override_root {
            return Self::new(root);
        }

        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("assets")));
        match beside_exe {
            Some(dir) if dir.is_dir() => {
                tracing::debug!("using assets next to executable: {}", dir.display());
                Self::new(dir)
            }
            _ => Self::new("assets"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn texture(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn cubemap_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
