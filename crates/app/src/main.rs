//! Entry point for Flyby.
//! Logging + CLI, then hands off to the platform loop.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum GpuBackend {
    #[default]
    Auto,
    #[value(alias = "vk")]
    Vulkan,
    #[value(alias = "d3d12")]
    Dx12,
    #[value(alias = "mtl")]
    Metal,
    #[value(alias = "opengl", alias = "gles")]
    Gl,
}

impl GpuBackend {
    fn backends(self) -> wgpu::Backends {
        match self {
            Self::Auto => wgpu::Backends::all(),
            Self::Vulkan => wgpu::Backends::VULKAN,
            Self::Dx12 => wgpu::Backends::DX12,
            Self::Metal => wgpu::Backends::METAL,
            Self::Gl => wgpu::Backends::GL,
        }
    }
}

/// `WxH`, both at least 1.
fn parse_size(v: &str) -> Result<(u32, u32), String> {
    let (w, h) = v
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{v}'"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    Ok((w.max(1), h.max(1)))
}

#[derive(Debug, Parser)]
#[command(name = "flyby", about = "Textured-mesh fly-camera demo")]
struct Cli {
    /// Graphics API to use
    #[arg(long, value_enum, default_value_t = GpuBackend::Auto)]
    gpu_backend: GpuBackend,

    /// Window size
    #[arg(long, value_parser = parse_size, default_value = "1280x780")]
    size: (u32, u32),

    /// Log the frame rate once per second
    #[arg(long)]
    show_fps: bool,

    /// Asset root containing textures/, meshes/ and shaders/out/
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Scene description JSON (built-in scene when omitted)
    #[arg(long)]
    scene: Option<PathBuf>,
}

impl Cli {
    fn run_config(self) -> platform::RunConfig {
        let (width, height) = self.size;
        platform::RunConfig {
            backends: self.gpu_backend.backends(),
            width,
            height,
            show_fps: self.show_fps,
            asset_root: self.assets,
            scene_path: self.scene,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!(
        "Starting Flyby. Backend: {:?}, show_fps={}, window_size={}x{}, assets={:?}",
        cli.gpu_backend,
        cli.show_fps,
        cli.size.0,
        cli.size.1,
        cli.assets
    );

    platform::run(cli.run_config())?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parsing() {
        assert_eq!(parse_size("800x600"), Ok((800, 600)));
        assert_eq!(parse_size("640X480"), Ok((640, 480)));
        assert_eq!(parse_size("0x0"), Ok((1, 1)));
        assert!(parse_size("800").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn defaults() {
        let cfg = Cli::try_parse_from(["flyby"]).unwrap().run_config();
        assert_eq!(cfg.backends, wgpu::Backends::all());
        assert_eq!((cfg.width, cfg.height), (1280, 780));
        assert!(!cfg.show_fps);
        assert_eq!(cfg.asset_root, PathBuf::from("assets"));
        assert!(cfg.scene_path.is_none());
    }

    #[test]
    fn backend_and_aliases() {
        let cli = Cli::try_parse_from(["flyby", "--gpu-backend", "vk", "--size=320x200"]).unwrap();
        assert_eq!(cli.gpu_backend, GpuBackend::Vulkan);
        assert_eq!(cli.size, (320, 200));

        let cli = Cli::try_parse_from(["flyby", "--gpu-backend", "gl", "--show-fps"]).unwrap();
        assert_eq!(cli.run_config().backends, wgpu::Backends::GL);

        assert!(Cli::try_parse_from(["flyby", "--gpu-backend", "glide"]).is_err());
    }
}
