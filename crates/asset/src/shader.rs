//! Shader bytecode discovery and the JSON binding-count sidecar.
//!
//! A logical shader `"<name>.vert"` lives at `shaders/out/<name>.vert.<ext>`
//! with its sidecar at `shaders/out/<name>.vert.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::paths::AssetPaths;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Stage from the logical name: `.vert` or `.frag`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.contains(".vert") {
            Some(Self::Vertex)
        } else if name.contains(".frag") {
            Some(Self::Fragment)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderFormat {
    SpirV,
    Glsl,
    Wgsl,
}

impl ShaderFormat {
    /// Preference order when several formats are usable.
    pub const PRIORITY: [ShaderFormat; 3] = [Self::SpirV, Self::Glsl, Self::Wgsl];

    pub fn extension(self) -> &'static str {
        match self {
            Self::SpirV => "spv",
            Self::Glsl => "glsl",
            Self::Wgsl => "wgsl",
        }
    }

    /// Binary and GLSL sources use `main`; WGSL holds per-stage entry points.
    pub fn entry_point(self, stage: ShaderStage) -> &'static str {
        match (self, stage) {
            (Self::SpirV | Self::Glsl, _) => "main",
            (Self::Wgsl, ShaderStage::Vertex) => "vs_main",
            (Self::Wgsl, ShaderStage::Fragment) => "fs_main",
        }
    }

    pub fn is_textual(self) -> bool {
        !matches!(self, Self::SpirV)
    }
}

/// Resource-binding counts declared next to the bytecode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShaderInfo {
    pub samplers: u32,
    pub storage_textures: u32,
    pub storage_buffers: u32,
    pub uniform_buffers: u32,
}

impl ShaderInfo {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse shader descriptor JSON")
    }

    /// Read `<base>.json`. Missing or malformed sidecars log and yield zero counts.
    pub fn load(base: &Path) -> Self {
        let path = with_extension(base, "json");
        let parsed = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read shader descriptor {}", path.display()))
            .and_then(|json| Self::from_json(&json));
        match parsed {
            Ok(info) => info,
            Err(e) => {
                log::error!("{:#}", e);
                Self::default()
            }
        }
    }
}

/// Bytecode (or source text) ready to hand to the GPU layer.
#[derive(Clone, Debug)]
pub struct ShaderSource {
    pub name: String,
    pub stage: ShaderStage,
    pub format: ShaderFormat,
    pub code: Vec<u8>,
    pub entry_point: &'static str,
    pub info: ShaderInfo,
}

impl ShaderSource {
    /// Source text for textual formats.
    pub fn text(&self) -> Result<&str> {
        if !self.format.is_textual() {
            return Err(anyhow!("{} is binary {:?}", self.name, self.format));
        }
        std::str::from_utf8(&self.code).with_context(|| format!("{} is not UTF-8", self.name))
    }
}

/// First format, in [`ShaderFormat::PRIORITY`] order, that is in `supported`
/// and has a file at `<base>.<ext>`.
pub fn select_format(base: &Path, supported: &[ShaderFormat]) -> Option<(ShaderFormat, PathBuf)> {
    ShaderFormat::PRIORITY
        .into_iter()
        .filter(|f| supported.contains(f))
        .map(|f| (f, with_extension(base, f.extension())))
        .find(|(_, path)| path.is_file())
}

/// Locate, read and describe the shader `name` for a backend accepting `supported`.
pub fn load_shader_source(
    paths: &AssetPaths,
    name: &str,
    supported: &[ShaderFormat],
) -> Result<ShaderSource> {
    let stage = ShaderStage::from_name(name)
        .ok_or_else(|| anyhow!("Invalid filename to determine shader stage: {name}"))?;

    let base = paths.shader_base(name);
    let (format, path) = select_format(&base, supported).ok_or_else(|| {
        anyhow!(
            "No shader file for {name} in any supported format {:?} under {}",
            supported,
            base.display()
        )
    })?;

    let code = std::fs::read(&path)
        .with_context(|| format!("Failed to load shader file: {}", path.display()))?;
    let info = ShaderInfo::load(&base);

    log::info!("Loaded shader {name} as {:?} ({} bytes), {:?}", format, code.len(), info);

    Ok(ShaderSource {
        name: name.to_owned(),
        stage,
        format,
        code,
        entry_point: format.entry_point(stage),
        info,
    })
}

fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader_dir() -> (tempfile::TempDir, AssetPaths) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("shaders/out")).unwrap();
        let paths = AssetPaths::new(dir.path());
        (dir, paths)
    }

    #[test]
    fn stage_from_name() {
        assert_eq!(ShaderStage::from_name("shader.vert"), Some(ShaderStage::Vertex));
        assert_eq!(ShaderStage::from_name("shader.frag"), Some(ShaderStage::Fragment));
        assert_eq!(ShaderStage::from_name("shader.comp"), None);
    }

    #[test]
    fn descriptor_fields_default_to_zero() {
        let info = ShaderInfo::from_json(r#"{ "uniform_buffers": 1 }"#).unwrap();
        assert_eq!(
            info,
            ShaderInfo { uniform_buffers: 1, ..ShaderInfo::default() }
        );
        assert!(ShaderInfo::from_json("{ nope").is_err());
    }

    #[test]
    fn missing_descriptor_is_all_zero() {
        assert_eq!(ShaderInfo::load(Path::new("no/such/shader.vert")), ShaderInfo::default());
    }

    #[test]
    fn priority_wins_over_supported_order() {
        let (_dir, paths) = shader_dir();
        let base = paths.shader_base("shader.vert");
        std::fs::write(with_extension(&base, "spv"), [3u8, 2, 35, 7]).unwrap();
        std::fs::write(with_extension(&base, "wgsl"), "// wgsl").unwrap();

        let supported = [ShaderFormat::Wgsl, ShaderFormat::SpirV];
        let (format, _) = select_format(&base, &supported).unwrap();
        assert_eq!(format, ShaderFormat::SpirV);

        let (format, _) = select_format(&base, &[ShaderFormat::Wgsl]).unwrap();
        assert_eq!(format, ShaderFormat::Wgsl);
    }

    #[test]
    fn falls_back_when_preferred_file_missing() {
        let (_dir, paths) = shader_dir();
        let base = paths.shader_base("shader.frag");
        std::fs::write(with_extension(&base, "wgsl"), "// wgsl").unwrap();
        let all = ShaderFormat::PRIORITY;
        assert_eq!(select_format(&base, &all).unwrap().0, ShaderFormat::Wgsl);
    }

    #[test]
    fn loads_source_with_sidecar() {
        let (_dir, paths) = shader_dir();
        let base = paths.shader_base("shader.frag");
        std::fs::write(with_extension(&base, "wgsl"), "@fragment fn fs_main() {}").unwrap();
        std::fs::write(with_extension(&base, "json"), r#"{"samplers": 1}"#).unwrap();

        let src = load_shader_source(&paths, "shader.frag", &ShaderFormat::PRIORITY).unwrap();
        assert_eq!(src.stage, ShaderStage::Fragment);
        assert_eq!(src.entry_point, "fs_main");
        assert_eq!(src.info.samplers, 1);
        assert!(src.text().unwrap().contains("fs_main"));
    }

    #[test]
    fn missing_bytecode_is_an_error() {
        let (_dir, paths) = shader_dir();
        assert!(load_shader_source(&paths, "shader.vert", &ShaderFormat::PRIORITY).is_err());
        assert!(load_shader_source(&paths, "shader.geom", &ShaderFormat::PRIORITY).is_err());
    }

    #[test]
    fn entry_point_conventions() {
        assert_eq!(ShaderFormat::SpirV.entry_point(ShaderStage::Fragment), "main");
        assert_eq!(ShaderFormat::Wgsl.entry_point(ShaderStage::Vertex), "vs_main");
    }
}
