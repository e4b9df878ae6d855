//! Platform layer: window, event loop and the per-frame drive of game + renderer.
//!
//! Input is collected from window/device events into an [`InputState`];
//! every redraw ticks the clock, updates the game and renders its draw list.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use asset::{AssetPaths, scene::SceneDesc};
use corelib::{
    SceneResult, Vec3,
    game::{DrawCall, Game, GameSettings},
    input::{InputState, MoveKey},
    scene::{Entity, ModelId, Scene},
    time::{FpsCounter, FrameClock},
    transform::Transform,
};
use renderer::{GpuState, ModelTable};
use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

/// Everything the shell needs from the command line.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
    pub show_fps: bool,
    pub asset_root: PathBuf,
    /// Scene JSON; the built-in scene when absent.
    pub scene_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            width: 1280,
            height: 780,
            show_fps: false,
            asset_root: PathBuf::from("assets"),
            scene_path: None,
        }
    }
}

/// WASD to movement keys.
pub fn map_key(code: KeyCode) -> Option<MoveKey> {
    match code {
        KeyCode::KeyW => Some(MoveKey::Forward),
        KeyCode::KeyS => Some(MoveKey::Back),
        KeyCode::KeyA => Some(MoveKey::Left),
        KeyCode::KeyD => Some(MoveKey::Right),
        _ => None,
    }
}

/// Spawn every entity of `desc` into a scene over `model_count` loaded models.
pub fn build_scene(desc: &SceneDesc, model_count: usize) -> SceneResult<Scene> {
    let mut scene = Scene::new(model_count);
    for e in &desc.entities {
        let transform = Transform::from_position_yaw(Vec3::from(e.position), e.yaw_degrees);
        let mut entity = Entity::new(ModelId(e.model), transform);
        if e.spin {
            entity = entity.spinning();
        }
        scene.spawn(entity)?;
    }
    Ok(scene)
}

/// What to do with a frame whose surface texture could not be acquired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameAction {
    Reconfigure,
    Skip,
    Fatal,
}

pub fn surface_error_action(err: &SurfaceError) -> FrameAction {
    match err {
        e if GpuState::is_surface_lost(e) => FrameAction::Reconfigure,
        SurfaceError::Timeout => FrameAction::Skip,
        _ => FrameAction::Fatal,
    }
}

/// Window-bound state, created on the first `resumed`.
struct Running {
    models: ModelTable,
    gpu: GpuState,
    game: Game,
    window: Arc<Window>,
}

struct App {
    config: RunConfig,
    paths: AssetPaths,
    scene_desc: SceneDesc,
    running: Option<Running>,
    input: InputState,
    clock: FrameClock,
    fps: FpsCounter,
    start: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: RunConfig, scene_desc: SceneDesc) -> Self {
        Self {
            paths: AssetPaths::new(config.asset_root.clone()),
            config,
            scene_desc,
            running: None,
            input: InputState::new(),
            clock: FrameClock::new(0),
            fps: FpsCounter::new(0),
            start: Instant::now(),
            error: None,
        }
    }

    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Record the first fatal error and leave the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{:#}", err);
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let attrs = Window::default_attributes()
            .with_title("Flyby")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );
        grab_cursor(&window);

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.config.backends,
            &self.paths,
        ))?;
        let models = gpu.load_models(&self.paths, &self.scene_desc.models)?;
        let scene = build_scene(&self.scene_desc, models.len())?;
        log::info!("Scene ready: {} entities", scene.len());

        let game = Game::new(scene, GameSettings::default());
        let now = self.now_ms();
        self.clock = FrameClock::new(now);
        self.fps = FpsCounter::new(now);

        Ok(Running {
            models,
            gpu,
            game,
            window,
        })
    }

    fn redraw(&mut self) -> Result<()> {
        let now = self.now_ms();
        let Some(running) = self.running.as_mut() else {
            return Ok(());
        };

        let dt = self.clock.tick(now);
        running.game.update(&mut self.input, dt);

        let draws: Vec<DrawCall> = running.game.draw_calls(running.gpu.aspect()).collect();
        let clear = running.game.settings.clear_color;
        match running.gpu.render(&running.models, &draws, clear) {
            Ok(()) => {}
            Err(e) => match surface_error_action(&e) {
                FrameAction::Reconfigure => {
                    log::warn!("Surface {e:?}; reconfiguring");
                    running.gpu.recreate_surface();
                }
                FrameAction::Skip => log::warn!("Surface timeout; frame skipped"),
                FrameAction::Fatal => {
                    return Err(anyhow::anyhow!("Failed to acquire frame: {e}"));
                }
            },
        }

        if self.config.show_fps {
            if let Some(fps) = self.fps.frame(now) {
                log::info!("FPS: {fps:.1}");
                running.window.set_title(&format!("Flyby - {fps:.0} FPS"));
            }
        }
        Ok(())
    }
}

/// Hide the cursor and keep it in the window for mouse-look.
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        log::warn!("Cursor grab unavailable: {e}");
    }
    window.set_cursor_visible(false);
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape && state == ElementState::Released {
                    log::info!("Escape released. Exiting event loop.");
                    event_loop.exit();
                } else if let Some(key) = map_key(code) {
                    self.input.set_key(key, state == ElementState::Pressed);
                }
            }
            WindowEvent::Focused(focused) => self.input.set_focused(focused),
            WindowEvent::Resized(size) => {
                log::info!("Resized: {}x{}", size.width, size.height);
                if let Some(running) = self.running.as_mut() {
                    running.gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.add_mouse_delta(dx as f32, dy as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

/// Open the window and run until quit. Setup and frame failures are logged
/// and returned; a normal quit returns `Ok(())`.
pub fn run(config: RunConfig) -> Result<()> {
    let scene_desc = match &config.scene_path {
        Some(path) => SceneDesc::load(path)?,
        None => SceneDesc::default(),
    };

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, scene_desc);
    event_loop.run_app(&mut app).context("Event loop error")?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
