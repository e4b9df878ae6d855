//! Drawable models: an uploaded mesh paired with a bound texture.

use std::sync::Arc;

use anyhow::Result;
use asset::{AssetPaths, obj::load_obj_or_empty, scene::ModelDesc, texture::TextureData};
use corelib::{SceneError, SceneResult, scene::MAX_MODELS, table::FixedTable};
use wgpu::{BindGroup, BindGroupLayout, Device, Queue, Sampler, Texture, TextureView};

use crate::upload::{GpuMesh, UploadBatch};

/// Sampled texture and the fragment-stage bind group that exposes it.
pub struct GpuTexture {
    pub texture: Texture,
    pub view: TextureView,
    pub bind_group: BindGroup,
}

pub struct GpuModel {
    pub mesh: GpuMesh,
    /// Shared by every model naming the same texture file.
    pub texture: Arc<GpuTexture>,
}

pub type ModelTable = FixedTable<GpuModel>;

/// Distinct texture filenames in first-use order, and for each model the
/// index of its texture in that list.
pub fn texture_slots(models: &[ModelDesc]) -> (Vec<&str>, Vec<usize>) {
    let mut names: Vec<&str> = Vec::new();
    let slots = models
        .iter()
        .map(|m| match names.iter().position(|n| *n == m.texture) {
            Some(i) => i,
            None => {
                names.push(&m.texture);
                names.len() - 1
            }
        })
        .collect();
    (names, slots)
}

/// Refuse a model list the table cannot hold, before anything is uploaded.
pub fn check_model_count(models: &[ModelDesc]) -> SceneResult<()> {
    if models.len() > MAX_MODELS {
        return Err(SceneError::CapacityExceeded {
            what: "models",
            capacity: MAX_MODELS,
        });
    }
    Ok(())
}

/// Everything texture upload needs to build a bind group.
pub struct TextureBinding<'a> {
    pub layout: &'a BindGroupLayout,
    pub sampler: &'a Sampler,
}

fn bind_texture(
    device: &Device,
    binding: &TextureBinding<'_>,
    label: &str,
    texture: Texture,
) -> GpuTexture {
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: binding.layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(binding.sampler),
            },
        ],
    });
    GpuTexture {
        texture,
        view,
        bind_group,
    }
}

/// Load every mesh and texture `models` names in one upload batch.
///
/// Missing meshes become empty (undrawn) models and missing textures the
/// checkerboard placeholder. More than [`MAX_MODELS`] models is an error and
/// nothing is submitted.
pub fn load_models(
    device: &Device,
    queue: &Queue,
    binding: &TextureBinding<'_>,
    paths: &AssetPaths,
    models: &[ModelDesc],
) -> Result<ModelTable> {
    check_model_count(models)?;
    let mut table = ModelTable::new("models", MAX_MODELS);
    let mut batch = UploadBatch::begin(device, queue);

    let (texture_names, slots) = texture_slots(models);
    let textures: Vec<Arc<GpuTexture>> = texture_names
        .iter()
        .map(|name| {
            let data = TextureData::load_or_placeholder(paths.texture(name));
            let texture = batch.upload_texture(name, &data);
            Arc::new(bind_texture(device, binding, name, texture))
        })
        .collect();

    for (desc, slot) in models.iter().zip(slots) {
        let mesh = load_obj_or_empty(paths.mesh(&desc.mesh));
        let model = GpuModel {
            mesh: batch.upload_mesh(&desc.mesh, &mesh),
            texture: Arc::clone(&textures[slot]),
        };
        table.push(model)?;
    }

    batch.finish();
    log::info!(
        "Loaded {} models sharing {} textures",
        table.len(),
        textures.len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(mesh: &str, texture: &str) -> ModelDesc {
        ModelDesc {
            mesh: mesh.into(),
            texture: texture.into(),
        }
    }

    #[test]
    fn textures_are_shared_by_name() {
        let models = [
            desc("tractor-police.obj", "colormap.png"),
            desc("race-future.obj", "colormap.png"),
            desc("cube.obj", "aju.jpg"),
        ];
        let (names, slots) = texture_slots(&models);
        assert_eq!(names, ["colormap.png", "aju.jpg"]);
        assert_eq!(slots, [0, 0, 1]);
    }

    #[test]
    fn no_models_no_textures() {
        let (names, slots) = texture_slots(&[]);
        assert!(names.is_empty());
        assert!(slots.is_empty());
    }

    #[test]
    fn model_count_is_capped() {
        let models: Vec<ModelDesc> = (0..MAX_MODELS + 1)
            .map(|i| desc(&format!("m{i}.obj"), "colormap.png"))
            .collect();
        assert_eq!(models.len(), 5);
        assert!(check_model_count(&models[..MAX_MODELS]).is_ok());
        let err = check_model_count(&models).unwrap_err();
        assert_eq!(
            err,
            SceneError::CapacityExceeded {
                what: "models",
                capacity: MAX_MODELS
            }
        );
        assert_eq!(err.to_string(), "too many models: capacity is 4");
    }
}
