//! Fixed on-disk layout of runtime assets.

use std::path::{Path, PathBuf};

pub const TEXTURES_DIR: &str = "textures";
pub const MESHES_DIR: &str = "meshes";
pub const SHADERS_DIR: &str = "shaders/out";

/// Resolves asset filenames against `<root>/textures`, `<root>/meshes`
/// and `<root>/shaders/out`.
#[derive(Clone, Debug)]
pub struct AssetPaths {
    root: PathBuf,
}

impl AssetPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn texture(&self, file: &str) -> PathBuf {
        self.root.join(TEXTURES_DIR).join(file)
    }

    pub fn mesh(&self, file: &str) -> PathBuf {
        self.root.join(MESHES_DIR).join(file)
    }

    /// `<root>/shaders/out/<name>` without extension; callers append
    /// the bytecode or sidecar extension.
    pub fn shader_base(&self, name: &str) -> PathBuf {
        self.root.join(SHADERS_DIR).join(name)
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::new("assets")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_fixed_prefixes() {
        let paths = AssetPaths::default();
        assert_eq!(paths.texture("colormap.png"), Path::new("assets/textures/colormap.png"));
        assert_eq!(paths.mesh("cube.obj"), Path::new("assets/meshes/cube.obj"));
        assert_eq!(paths.shader_base("shader.vert"), Path::new("assets/shaders/out/shader.vert"));
    }
}
