//! Scene description: which models to load and where to place them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A mesh file paired with a texture file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDesc {
    pub mesh: String,
    pub texture: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDesc {
    /// Index into [`SceneDesc::models`].
    pub model: usize,
    #[serde(default)]
    pub position: [f32; 3],
    /// Initial heading about +Y.
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default)]
    pub spin: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDesc {
    pub models: Vec<ModelDesc>,
    pub entities: Vec<EntityDesc>,
}

impl SceneDesc {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse scene description")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file {}", path.display()))?;
        let scene = Self::from_json(&json)?;
        log::info!(
            "Scene {:?}: {} models, {} entities",
            path,
            scene.models.len(),
            scene.entities.len()
        );
        Ok(scene)
    }
}

impl Default for SceneDesc {
    /// Two vehicles flanking a spinning textured cube.
    fn default() -> Self {
        let model = |mesh: &str, texture: &str| ModelDesc {
            mesh: mesh.to_owned(),
            texture: texture.to_owned(),
        };
        Self {
            models: vec![
                model("tractor-police.obj", "colormap.png"),
                model("race-future.obj", "colormap.png"),
                model("cube.obj", "aju.jpg"),
            ],
            entities: vec![
                EntityDesc {
                    model: 0,
                    position: [2.5, 0.0, 0.0],
                    yaw_degrees: 15.0,
                    spin: false,
                },
                EntityDesc {
                    model: 1,
                    position: [-2.5, 0.0, 0.0],
                    yaw_degrees: -15.0,
                    spin: false,
                },
                EntityDesc {
                    model: 2,
                    position: [0.0, 0.8, 0.0],
                    yaw_degrees: 0.0,
                    spin: true,
                },
            ],
        }
    }
}
