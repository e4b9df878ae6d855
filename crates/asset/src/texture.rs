//! Image decoding to tightly packed RGBA8.
//! Images are flipped so row 0 is the bottom of the picture
//! (OBJ texture coordinates put v = 0 at the bottom).

use std::path::Path;

use anyhow::{Context, Result, bail};

pub const BYTES_PER_PIXEL: u32 = 4;

/// Side length of the substitute for unreadable textures.
pub const PLACEHOLDER_SIZE: u32 = 64;

/// RGBA8 pixels ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl TextureData {
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL as usize;
        if data.len() != expected {
            bail!("{width}x{height} RGBA8 needs {expected} bytes, got {}", data.len());
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Decode a PNG or JPEG file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).with_context(|| format!("Cannot decode {}", path.display()))?;
        let tex = Self::from_image(img)?;
        log::info!("Loaded texture {:?}: {}x{}", path, tex.width, tex.height);
        Ok(tex)
    }

    /// Decode an in-memory PNG or JPEG.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).context("Cannot decode image bytes")?;
        Self::from_image(img)
    }

    fn from_image(img: image::DynamicImage) -> Result<Self> {
        let rgba = img.flipv().into_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// [`TextureData::load`], or the checkerboard if that fails.
    pub fn load_or_placeholder(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::error!("Failed to load texture: {:#}; using placeholder", e);
            Self::checkerboard(PLACEHOLDER_SIZE)
        })
    }

    /// White/magenta squares, 8 pixels to a side.
    pub fn checkerboard(size: u32) -> Self {
        const WHITE: [u8; 4] = [255, 255, 255, 255];
        const MAGENTA: [u8; 4] = [255, 0, 255, 255];
        let data = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x / 8 + y / 8) % 2))
            .flat_map(|cell| if cell == 0 { WHITE } else { MAGENTA })
            .collect();
        Self {
            data,
            width: size,
            height: size,
        }
    }

    /// Bytes in one unpadded row.
    pub fn row_bytes(&self) -> u32 {
        self.width * BYTES_PER_PIXEL
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.row_bytes() * self.height) as usize
    }
}
