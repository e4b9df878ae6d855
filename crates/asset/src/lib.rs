//! Asset loading/parsers (meshes, textures, shaders, scene descriptions).
//! Everything here is CPU-side; GPU upload lives in the renderer.

pub mod mesh;
pub mod obj;
pub mod paths;
pub mod scene;
pub mod shader;
pub mod texture;

pub use paths::AssetPaths;
