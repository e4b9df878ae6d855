//! Staged copy pass: CPU data -> mapped staging buffers -> device-local resources.
//! All copies of one batch go into a single command buffer.

use std::borrow::Cow;

use asset::{mesh::MeshData, texture::TextureData};
use wgpu::{
    Buffer, BufferDescriptor, BufferUsages, CommandEncoder, CommandEncoderDescriptor, Device,
    Extent3d, Queue, Texture, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};

/// Format every sampled texture is uploaded as.
pub const TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

/// Mesh buffers on the GPU. Empty meshes own no buffers and draw nothing.
pub struct GpuMesh {
    pub vertex_buffer: Option<Buffer>,
    pub index_buffer: Option<Buffer>,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn empty() -> Self {
        Self {
            vertex_buffer: None,
            index_buffer: None,
            index_count: 0,
        }
    }

    /// Vertex and index buffers, when there is anything to draw.
    pub fn drawable_buffers(&self) -> Option<(&Buffer, &Buffer)> {
        match (&self.vertex_buffer, &self.index_buffer) {
            (Some(vb), Some(ib)) if self.index_count > 0 => Some((vb, ib)),
            _ => None,
        }
    }
}

/// Round `value` up to a multiple of `alignment` (a power of two).
pub fn align_to(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Row pitch the buffer-to-texture copy requires for `row_bytes` of pixels.
pub fn padded_bytes_per_row(row_bytes: u32) -> u32 {
    align_to(row_bytes as u64, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64) as u32
}

/// Re-lay `data` so each of its rows starts on a `padded` boundary.
pub fn pad_rows(data: &[u8], row_bytes: usize, padded: usize) -> Cow<'_, [u8]> {
    if row_bytes == padded || row_bytes == 0 {
        return Cow::Borrowed(data);
    }
    let rows = data.len() / row_bytes;
    let mut out = vec![0u8; rows * padded];
    for (src, dst) in data.chunks_exact(row_bytes).zip(out.chunks_exact_mut(padded)) {
        dst[..row_bytes].copy_from_slice(src);
    }
    Cow::Owned(out)
}

pub struct UploadBatch<'a> {
    device: &'a Device,
    queue: &'a Queue,
    encoder: CommandEncoder,
    staging: Vec<Buffer>,
}

impl<'a> UploadBatch<'a> {
    pub fn begin(device: &'a Device, queue: &'a Queue) -> Self {
        let encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("UploadEncoder"),
        });
        Self {
            device,
            queue,
            encoder,
            staging: Vec::new(),
        }
    }

    /// Copy `bytes` into a fresh mapped staging buffer and keep it alive until submit.
    fn stage(&mut self, bytes: &[u8]) -> (usize, u64) {
        let size = align_to(bytes.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = self.device.create_buffer(&BufferDescriptor {
            label: Some("StagingBuffer"),
            size,
            usage: BufferUsages::MAP_WRITE | BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        {
            let mut view = buffer.slice(..).get_mapped_range_mut();
            view[..bytes.len()].copy_from_slice(bytes);
        }
        buffer.unmap();
        self.staging.push(buffer);
        (self.staging.len() - 1, size)
    }

    /// Device-local buffer with `usage | COPY_DST`, filled through a staging copy.
    pub fn upload_buffer(&mut self, label: &str, bytes: &[u8], usage: BufferUsages) -> Buffer {
        let (slot, size) = self.stage(bytes);
        let buffer = self.device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size,
            usage: usage | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.encoder
            .copy_buffer_to_buffer(&self.staging[slot], 0, &buffer, 0, size);
        buffer
    }

    pub fn upload_mesh(&mut self, label: &str, mesh: &MeshData) -> GpuMesh {
        if !mesh.is_valid() {
            log::warn!("Mesh {label} is empty; nothing uploaded");
            return GpuMesh::empty();
        }
        let vertex_buffer = self.upload_buffer(
            &format!("{label} VB"),
            mesh.vertex_bytes(),
            BufferUsages::VERTEX,
        );
        let index_buffer = self.upload_buffer(
            &format!("{label} IB"),
            mesh.index_bytes(),
            BufferUsages::INDEX,
        );
        log::debug!(
            "Uploaded mesh {label}: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.index_count()
        );
        GpuMesh {
            vertex_buffer: Some(vertex_buffer),
            index_buffer: Some(index_buffer),
            index_count: mesh.index_count(),
        }
    }

    /// Sampled 2D texture in [`TEXTURE_FORMAT`].
    pub fn upload_texture(&mut self, label: &str, tex: &TextureData) -> Texture {
        let size = Extent3d {
            width: tex.width.max(1),
            height: tex.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let row_bytes = tex.row_bytes();
        let padded = padded_bytes_per_row(row_bytes);
        let data = pad_rows(&tex.data, row_bytes as usize, padded as usize);
        let (slot, _) = self.stage(&data);

        self.encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging[slot],
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(tex.height),
                },
            },
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            size,
        );
        log::debug!("Uploaded texture {label}: {}x{}", tex.width, tex.height);
        texture
    }

    /// Submit every recorded copy. Staging buffers are released afterwards.
    pub fn finish(self) {
        let count = self.staging.len();
        self.queue.submit(Some(self.encoder.finish()));
        log::info!("Upload batch submitted ({count} staging buffers)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_rounds_up() {
        assert_eq!(align_to(0, 4), 0);
        assert_eq!(align_to(1, 4), 4);
        assert_eq!(align_to(36, 4), 36);
        assert_eq!(align_to(64, 256), 256);
        assert_eq!(align_to(257, 256), 512);
    }

    #[test]
    fn row_pitch_matches_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64 * 4), 256);
        assert_eq!(padded_bytes_per_row(3 * 4), 256);
        assert_eq!(padded_bytes_per_row(100 * 4), 512);
    }

    #[test]
    fn rows_keep_their_pixels_after_padding() {
        let data: Vec<u8> = (0..8).collect();
        let padded = pad_rows(&data, 4, 8);
        assert_eq!(&padded[..], &[0, 1, 2, 3, 0, 0, 0, 0, 4, 5, 6, 7, 0, 0, 0, 0]);
    }

    #[test]
    fn aligned_rows_are_borrowed() {
        let data = vec![1u8; 512];
        assert!(matches!(pad_rows(&data, 256, 256), Cow::Borrowed(_)));
    }

    #[test]
    fn empty_mesh_is_not_drawable() {
        assert!(GpuMesh::empty().drawable_buffers().is_none());
    }
}
