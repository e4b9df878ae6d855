//! Shader modules from on-disk bytecode, picked per backend.

use anyhow::{Result, bail};
use asset::{
    AssetPaths,
    shader::{ShaderFormat, ShaderInfo, ShaderSource, ShaderStage, load_shader_source},
};
use wgpu::{Backend, Device, ShaderModule, ShaderModuleDescriptor};

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Bytecode formats a backend can ingest, in no particular order.
pub fn supported_formats(backend: Backend) -> &'static [ShaderFormat] {
    match backend {
        Backend::Vulkan => &[ShaderFormat::SpirV, ShaderFormat::Wgsl],
        Backend::Gl => &[ShaderFormat::Glsl, ShaderFormat::Wgsl],
        _ => &[ShaderFormat::Wgsl],
    }
}

/// Word-aligned with the SPIR-V magic number in either byte order.
pub fn is_spirv(code: &[u8]) -> bool {
    if code.len() < 4 || code.len() % 4 != 0 {
        return false;
    }
    let head = [code[0], code[1], code[2], code[3]];
    u32::from_le_bytes(head) == SPIRV_MAGIC || u32::from_be_bytes(head) == SPIRV_MAGIC
}

/// The pipeline binds one uniform buffer to the vertex stage and one
/// texture/sampler pair to the fragment stage, and nothing else.
pub fn validate_bindings(vertex: &ShaderInfo, fragment: &ShaderInfo) -> Result<()> {
    let check = |stage: &str, info: &ShaderInfo, uniforms: u32, samplers: u32| -> Result<()> {
        if info.uniform_buffers != uniforms || info.samplers != samplers {
            bail!(
                "{stage}: {} uniform buffers and {} samplers, expected {uniforms} and {samplers}",
                info.uniform_buffers,
                info.samplers
            );
        }
        if info.storage_buffers != 0 || info.storage_textures != 0 {
            bail!(
                "{stage} shader declares storage resources ({} buffers, {} textures)",
                info.storage_buffers,
                info.storage_textures
            );
        }
        Ok(())
    };
    check("Vertex", vertex, 1, 0)?;
    check("Fragment", fragment, 0, 1)
}

fn naga_stage(stage: ShaderStage) -> wgpu::naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => wgpu::naga::ShaderStage::Vertex,
        ShaderStage::Fragment => wgpu::naga::ShaderStage::Fragment,
    }
}

/// Create the GPU module for already-loaded bytecode. Invalid code is
/// logged and yields `None`.
pub async fn create_shader_module(device: &Device, src: &ShaderSource) -> Option<ShaderModule> {
    let label = Some(src.name.as_str());
    let text = || src.text().map_err(|e| log::error!("{:#}", e)).ok();
    let source = match src.format {
        ShaderFormat::SpirV => {
            if !is_spirv(&src.code) {
                log::error!("{} is not valid SPIR-V", src.name);
                return None;
            }
            wgpu::util::make_spirv(&src.code)
        }
        ShaderFormat::Glsl => wgpu::ShaderSource::Glsl {
            shader: text()?.into(),
            stage: naga_stage(src.stage),
            defines: Default::default(),
        },
        ShaderFormat::Wgsl => wgpu::ShaderSource::Wgsl(text()?.into()),
    };

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(ShaderModuleDescriptor { label, source });
    if let Some(err) = device.pop_error_scope().await {
        log::error!("Failed to create shader {}: {}", src.name, err);
        return None;
    }
    Some(module)
}

/// Find, read and compile the shader `name` for `backend`.
/// Any failure is logged and yields `None`.
pub async fn load_shader(
    device: &Device,
    paths: &AssetPaths,
    name: &str,
    backend: Backend,
) -> Option<(ShaderModule, ShaderSource)> {
    let src = match load_shader_source(paths, name, supported_formats(backend)) {
        Ok(src) => src,
        Err(e) => {
            log::error!("{:#}", e);
            return None;
        }
    };
    let module = create_shader_module(device, &src).await?;
    Some((module, src))
}
