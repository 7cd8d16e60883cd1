//! blockshade - mapblock viewer
//!
//! Renders voxel mapblock meshes with texture-array surfaces, directional face
//! shading and distance fog, or a single debug triangle.

mod config;
mod input;
mod scene;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use blockshade_render::{
    InputState, RenderMode, Renderer, RendererConfig, WindowConfig, WindowManager,
};
use clap::{Parser, ValueEnum};
use config::{ViewerConfig, DEFAULT_CONFIG_PATH};
use glam::Vec3;
use input::{Action, CameraController};
use tracing::{info, warn};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Textured, shaded and fogged mapblocks
    Mapblocks,
    /// Hardcoded red triangle
    Triangle,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Mapblocks => RenderMode::Mapblocks,
            ModeArg::Triangle => RenderMode::DebugTriangle,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Mapblock viewer with face shading and distance fog", long_about = None)]
struct Cli {
    /// Which pass to draw
    #[arg(long, value_enum, default_value_t = ModeArg::Mapblocks)]
    mode: ModeArg,

    /// JSON mesh dump to display instead of the generated terrain
    #[arg(long)]
    mesh: Option<PathBuf>,

    /// Directory of node textures (PNG/JPEG), bound in file-name order after the fallback
    #[arg(long)]
    textures: Option<PathBuf>,

    /// Viewer configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Render offscreen without opening a window
    #[arg(long)]
    headless: bool,

    /// Where to save the rendered frame (headless only)
    #[arg(long, requires = "headless")]
    screenshot: Option<PathBuf>,

    /// Override the configured width
    #[arg(long)]
    width: Option<u32>,

    /// Override the configured height
    #[arg(long)]
    height: Option<u32>,

    /// Write the effective configuration (file plus overrides) to --config and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting blockshade v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let viewer = effective_config(&cli);

    if cli.write_config {
        viewer
            .save_to_path(&cli.config)
            .with_context(|| format!("writing config to {}", cli.config.display()))?;
        info!(path = %cli.config.display(), "Configuration written");
        return Ok(());
    }

    if cli.headless {
        run_headless(&cli, &viewer)
    } else {
        run_windowed(&cli, viewer)
    }
}

/// The config file with command-line overrides applied.
fn effective_config(cli: &Cli) -> ViewerConfig {
    let mut viewer = ViewerConfig::load_from_path(&cli.config);
    if let Some(width) = cli.width {
        viewer.width = width.max(1);
    }
    if let Some(height) = cli.height {
        viewer.height = height.max(1);
    }
    if cli.textures.is_some() {
        viewer.texture_dir = cli.textures.clone();
    }
    viewer
}

fn renderer_config(viewer: &ViewerConfig, headless: bool) -> RendererConfig {
    RendererConfig {
        width: viewer.width,
        height: viewer.height,
        headless,
        vsync: viewer.vsync,
    }
}

fn apply_camera_settings(renderer: &mut Renderer, viewer: &ViewerConfig) {
    let camera = renderer.camera_mut();
    camera.fov = viewer.fov_degrees.to_radians();
    camera.z_far = viewer.view_distance;
    camera.fog_color = Vec3::from_array(viewer.fog_color);
    // Above the generated terrain, looking across it.
    camera.position = Vec3::new(-6.0, 12.0, -6.0);
    camera.yaw = std::f32::consts::FRAC_PI_4;
    camera.pitch = -0.35;
}

/// Load textures and meshes. Returns the mode that can actually be drawn.
fn prepare_scene(
    renderer: &mut Renderer,
    cli: &Cli,
    viewer: &ViewerConfig,
    mode: RenderMode,
) -> Result<RenderMode> {
    if !renderer.supports_mapblocks() {
        if mode == RenderMode::Mapblocks {
            warn!("Mapblock rendering unavailable on this GPU; showing the debug triangle");
        }
        return Ok(RenderMode::DebugTriangle);
    }

    let texture_count = renderer.load_textures(viewer.texture_dir.as_deref())?;
    for mesh in scene::load_scene(cli.mesh.as_deref(), texture_count as u32)? {
        renderer.upload_mesh(&mesh)?;
    }
    Ok(mode)
}

fn run_headless(cli: &Cli, viewer: &ViewerConfig) -> Result<()> {
    let mut renderer = Renderer::new(renderer_config(viewer, true));
    pollster::block_on(renderer.initialize_gpu_headless())?;
    apply_camera_settings(&mut renderer, viewer);

    let mode = prepare_scene(&mut renderer, cli, viewer, cli.mode.into())?;
    let frame = renderer.capture_frame(mode)?;

    match &cli.screenshot {
        Some(path) => {
            frame
                .save_png(path)
                .with_context(|| format!("saving screenshot to {}", path.display()))?;
            info!(path = %path.display(), ?mode, "Screenshot written");
        }
        None => info!(?mode, "Rendered headless frame (no --screenshot given)"),
    }
    Ok(())
}

fn run_windowed(cli: &Cli, viewer: ViewerConfig) -> Result<()> {
    let window_config = WindowConfig {
        title: format!("blockshade v{}", env!("CARGO_PKG_VERSION")),
        width: viewer.width,
        height: viewer.height,
        vsync: viewer.vsync,
    };
    let window_manager = WindowManager::new(&window_config)?;

    let mut renderer = Renderer::new(renderer_config(&viewer, false));
    pollster::block_on(renderer.initialize_gpu(window_manager.window()))?;
    apply_camera_settings(&mut renderer, &viewer);

    let mut mode = prepare_scene(&mut renderer, cli, &viewer, cli.mode.into())?;
    let can_toggle = renderer.supports_mapblocks();
    let controller = CameraController::new(&viewer);
    let mut input = InputState::new();
    let mut last_frame = Instant::now();

    info!(?mode, "Entering main loop (Esc quits, F1 toggles mode, Tab grabs mouse)");

    window_manager.run(move |event, window| {
        match event {
            Event::WindowEvent { event, .. } => {
                input.handle_event(&event);
                match event {
                    WindowEvent::CloseRequested => return false,
                    WindowEvent::Resized(size) => {
                        renderer.resize((size.width, size.height));
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } if !input.cursor_captured => {
                        input.set_cursor_capture(window, true);
                    }
                    WindowEvent::RedrawRequested => {
                        for action in CameraController::actions(&input) {
                            match action {
                                Action::Quit => return false,
                                Action::ToggleMode if can_toggle => {
                                    mode = mode.toggled();
                                    info!(?mode, "Render mode switched");
                                }
                                Action::ToggleMode => {
                                    warn!("Mapblock mode unavailable on this GPU");
                                }
                                Action::ToggleCursor => {
                                    let capture = !input.cursor_captured;
                                    input.set_cursor_capture(window, capture);
                                }
                            }
                        }

                        let now = Instant::now();
                        let dt = (now - last_frame).as_secs_f32().min(0.1);
                        last_frame = now;
                        controller.update_camera(renderer.camera_mut(), &input, dt);
                        input.reset_frame();

                        if let Err(err) = renderer.render_frame(mode) {
                            tracing::error!("Frame failed: {err:#}");
                            return false;
                        }
                    }
                    _ => {}
                }
            }
            Event::DeviceEvent { event, .. } => input.handle_device_event(&event),
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        }
        true
    })
}
