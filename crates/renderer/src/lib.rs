//! Renderer: wgpu init, depth, textured-mesh pipeline and per-draw uniforms.
//! wgpu = 0.26.x, winit = 0.30.x

pub mod model;
pub mod shader;
pub mod upload;

use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use asset::{AssetPaths, mesh::MeshVertex, scene::ModelDesc};
use bytemuck::{Pod, Zeroable};
use corelib::{game::DrawCall, scene::MAX_ENTITIES};
use wgpu::{
    Backends, BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState,
    ColorWrites, CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device,
    DeviceDescriptor, Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits,
    LoadOp, Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    Sampler, ShaderStages, StoreOp, Surface, SurfaceConfiguration, SurfaceError,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, VertexBufferLayout, VertexState, VertexStepMode,
};
use winit::{dpi::PhysicalSize, window::Window};

pub use model::{GpuModel, ModelTable};

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4, 2 => Float32x2];

/// Vertex buffer layout of [`MeshVertex`]: position, color, uv.
pub const MESH_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<MeshVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &MESH_ATTRIBUTES,
};

/// Per-draw UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DrawUniform {
    mvp: [[f32; 4]; 4],
}

const DRAW_UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;

/// Depth formats in order of preference.
pub const DEPTH_CANDIDATES: [TextureFormat; 3] = [
    TextureFormat::Depth32Float,
    TextureFormat::Depth24Plus,
    TextureFormat::Depth16Unorm,
];

/// First candidate `renderable` accepts as a render attachment.
pub fn select_depth_format(renderable: impl Fn(TextureFormat) -> bool) -> Option<TextureFormat> {
    DEPTH_CANDIDATES.into_iter().find(|f| renderable(*f))
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline
    pipeline: RenderPipeline,
    texture_bgl: BindGroupLayout,
    sampler: Sampler,

    // Per-draw uniforms, one aligned slot per entity
    uniform_buf: Buffer,
    uniform_bg: BindGroup,
    uniform_stride: u64,

    // Depth
    depth_format: TextureFormat,
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>, restricted to `backends`.
    /// Shaders are read from `paths`.
    pub async fn new(window: Arc<Window>, backends: Backends, paths: &AssetPaths) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Flyby Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("Failed to create GPU device")?;
        device.on_uncaptured_error(Box::new(|e: wgpu::Error| log::error!("wgpu: {e}")));

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = caps.formats.first() else {
            bail!("Surface reports no supported formats");
        };
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(first_format);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // Depth texture
        let depth_format = select_depth_format(|f| {
            adapter
                .get_texture_format_features(f)
                .allowed_usages
                .contains(TextureUsages::RENDER_ATTACHMENT)
        })
        .context("No depth format usable as a render attachment")?;
        log::info!("Surface {:?}, depth {:?}", surface_format, depth_format);
        let depth_view = create_depth_view(&device, &surface_config, depth_format);

        // ==== Shaders ====
        let vs = shader::load_shader(&device, paths, "shader.vert", info.backend).await;
        let fs = shader::load_shader(&device, paths, "shader.frag", info.backend).await;
        let (Some((vs_module, vs_src)), Some((fs_module, fs_src))) = (vs, fs) else {
            bail!("Failed to load shaders for {:?}; pipeline not created", info.backend);
        };
        shader::validate_bindings(&vs_src.info, &fs_src.info)
            .context("Shader bindings do not match the pipeline layout")?;

        // ==== Per-draw uniform BGL/BG (group 0, dynamic offset) ====
        let uniform_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Draw BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let uniform_stride = upload::align_to(
            DRAW_UNIFORM_SIZE,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw UBO"),
            size: uniform_stride * MAX_ENTITIES as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw BG"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buf,
                    offset: 0,
                    size: NonZeroU64::new(DRAW_UNIFORM_SIZE),
                }),
            }],
        });

        // ==== Texture BGL (group 1) + sampler ====
        let texture_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Texture BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Nearest Repeat"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mesh PipelineLayout"),
            bind_group_layouts: &[&uniform_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &vs_module,
                entry_point: Some(vs_src.entry_point),
                buffers: &[MESH_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &fs_module,
                entry_point: Some(fs_src.entry_point),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            texture_bgl,
            sampler,
            uniform_buf,
            uniform_bg,
            uniform_stride,
            depth_format,
            depth_view,
            width,
            height,
        })
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Upload every model of a scene in one batch.
    pub fn load_models(&self, paths: &AssetPaths, models: &[ModelDesc]) -> Result<ModelTable> {
        let binding = model::TextureBinding {
            layout: &self.texture_bgl,
            sampler: &self.sampler,
        };
        model::load_models(&self.device, &self.queue, &binding, paths, models)
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config, self.depth_format);
    }

    /// Render one frame: write per-draw MVPs, clear, draw every drawable model.
    pub fn render(
        &mut self,
        models: &ModelTable,
        draws: &[DrawCall],
        clear_color: [f64; 4],
    ) -> Result<(), SurfaceError> {
        let slots = MAX_ENTITIES.min(draws.len());
        if draws.len() > slots {
            log::warn!("Dropping {} draws over the uniform capacity", draws.len() - slots);
        }
        let draws = &draws[..slots];

        // --- per-draw MVPs
        let stride = self.uniform_stride as usize;
        let mut staging = vec![0u8; stride * slots.max(1)];
        for (chunk, draw) in staging.chunks_exact_mut(stride).zip(draws) {
            let u = DrawUniform {
                mvp: draw.mvp.to_cols_array_2d(),
            };
            chunk[..DRAW_UNIFORM_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&u));
        }
        self.queue.write_buffer(&self.uniform_buf, 0, &staging);

        // --- frame & pass
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let [r, g, b, a] = clear_color;
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None, // required in 0.26
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            for (slot, draw) in draws.iter().enumerate() {
                let Some(model) = models.get(draw.model.0) else {
                    continue;
                };
                let Some((vb, ib)) = model.mesh.drawable_buffers() else {
                    continue;
                };
                let offset = (slot as u64 * self.uniform_stride) as u32;
                rpass.set_bind_group(0, &self.uniform_bg, &[offset]);
                rpass.set_bind_group(1, &model.texture.bind_group, &[]);
                rpass.set_vertex_buffer(0, vb.slice(..));
                rpass.set_index_buffer(ib.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..model.mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(
    device: &Device,
    sc: &SurfaceConfiguration,
    format: TextureFormat,
) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_layout_matches_vertex() {
        assert_eq!(MESH_LAYOUT.array_stride, 36);
        assert_eq!(MESH_ATTRIBUTES[1].offset, 12);
        assert_eq!(MESH_ATTRIBUTES[2].offset, 28);
    }

    #[test]
    fn depth_prefers_32_bit() {
        assert_eq!(select_depth_format(|_| true), Some(TextureFormat::Depth32Float));
    }

    #[test]
    fn depth_falls_back_in_order() {
        let no_d32 = |f: TextureFormat| f != TextureFormat::Depth32Float;
        assert_eq!(select_depth_format(no_d32), Some(TextureFormat::Depth24Plus));
        let only_d16 = |f: TextureFormat| f == TextureFormat::Depth16Unorm;
        assert_eq!(select_depth_format(only_d16), Some(TextureFormat::Depth16Unorm));
        assert_eq!(select_depth_format(|_| false), None);
    }

    #[test]
    fn draw_uniform_is_one_matrix() {
        assert_eq!(DRAW_UNIFORM_SIZE, 64);
    }

    #[test]
    fn surface_loss_classification() {
        assert!(GpuState::is_surface_lost(&SurfaceError::Lost));
        assert!(GpuState::is_surface_lost(&SurfaceError::Outdated));
        assert!(!GpuState::is_surface_lost(&SurfaceError::Timeout));
        assert!(!GpuState::is_surface_lost(&SurfaceError::OutOfMemory));
    }
}
