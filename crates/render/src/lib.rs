#![warn(missing_docs)]
//! Rendering facade: wgpu host for the mapblock shading core.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use glam::IVec3;
use thiserror::Error;

mod camera;
mod context;
mod frustum;
mod mesh;
mod pipeline;
mod screenshot;
mod texture;
mod window;

pub use camera::{Camera, CameraBinding};
pub use context::{HeadlessTarget, RenderContext, TEXTURE_ARRAY_FEATURES};
pub use frustum::{BoundingSphere, Frustum, Plane};
pub use mesh::{
    load_mesh_dump, parse_mesh_dump, vertex_layout, CubeFace, MapblockMesh, MeshData,
    MeshDumpError, MAPBLOCK_SIZE, QUAD_INDICES,
};
pub use pipeline::{DebugTrianglePipeline, MapblockPipeline};
pub use screenshot::{FrameCapture, PendingCapture};
pub use texture::{
    create_depth_texture, load_texture_dir, NodeTextureArray, TextureImage, TextureLoadError,
    DEPTH_FORMAT, FALLBACK_TEXTURE_INDEX,
};
pub use window::{InputState, WindowConfig, WindowManager};

/// Colour format used for offscreen rendering.
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Renderer configuration for headless + onscreen paths.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Request a headless (off-screen) target.
    pub headless: bool,
    /// Wait for vertical sync when presenting.
    pub vsync: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            headless: false,
            vsync: true,
        }
    }
}

/// Which pass a frame runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Textured, shaded and fogged mapblock meshes.
    #[default]
    Mapblocks,
    /// The hardcoded red triangle.
    DebugTriangle,
}

impl RenderMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::Mapblocks => RenderMode::DebugTriangle,
            RenderMode::DebugTriangle => RenderMode::Mapblocks,
        }
    }
}

/// Errors surfaced by [`Renderer`] operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// GPU resources have not been created yet.
    #[error("renderer has no GPU context; call initialize_gpu first")]
    NotInitialized,
    /// The device cannot index texture binding arrays.
    #[error("GPU is missing required features {0:?}")]
    MissingFeatures(wgpu::Features),
    /// More textures than one binding array may hold.
    #[error("{count} textures exceed the device limit of {max}")]
    TooManyTextures {
        /// Textures requested.
        count: usize,
        /// Device limit.
        max: u32,
    },
    /// Mapblock mode was requested before textures were loaded.
    #[error("no node textures loaded")]
    NoTextures,
    /// The mesh failed validation.
    #[error(transparent)]
    InvalidMesh(#[from] MeshDumpError),
}

/// Per-frame draw counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Mapblocks that passed the frustum test and were drawn.
    pub drawn: usize,
    /// Mapblocks skipped by frustum culling.
    pub culled: usize,
}

struct GpuResources {
    camera_binding: CameraBinding,
    depth: (wgpu::Texture, wgpu::TextureView),
    triangle: DebugTrianglePipeline,
    mapblocks: Option<MapblockResources>,
}

struct MapblockResources {
    textures: NodeTextureArray,
    pipeline: MapblockPipeline,
}

/// Main renderer owning GPU resources.
pub struct Renderer {
    config: RendererConfig,
    context: Option<RenderContext>,
    gpu: Option<GpuResources>,
    camera: Camera,
    meshes: HashMap<IVec3, MapblockMesh>,
}

impl Renderer {
    /// Construct a renderer with the supplied config.
    pub fn new(config: RendererConfig) -> Self {
        let camera = Camera::new(config.width.max(1) as f32 / config.height.max(1) as f32);
        tracing::info!(?config, "renderer created");

        Self {
            config,
            context: None,
            gpu: None,
            camera,
            meshes: HashMap::new(),
        }
    }

    /// Initialize GPU resources with a window (async).
    pub async fn initialize_gpu(
        &mut self,
        window: std::sync::Arc<winit::window::Window>,
    ) -> anyhow::Result<()> {
        let context = RenderContext::new(window, self.config.vsync).await?;
        self.install_context(context);
        Ok(())
    }

    /// Initialize GPU resources for headless/offscreen rendering (async).
    pub async fn initialize_gpu_headless(&mut self) -> anyhow::Result<()> {
        let context =
            RenderContext::new_headless((self.config.width, self.config.height), HEADLESS_FORMAT)
                .await?;
        self.install_context(context);
        Ok(())
    }

    fn install_context(&mut self, context: RenderContext) {
        let gpu = GpuResources {
            camera_binding: CameraBinding::new(&context.device),
            depth: create_depth_texture(&context.device, context.size),
            triangle: DebugTrianglePipeline::new(&context.device, context.config.format),
            mapblocks: None,
        };

        self.camera.set_aspect(context.aspect_ratio());
        self.config.width = context.size.0;
        self.config.height = context.size.1;
        self.meshes.clear();
        self.context = Some(context);
        self.gpu = Some(gpu);
    }

    /// Whether the device supports mapblock rendering at all.
    pub fn supports_mapblocks(&self) -> bool {
        self.context.as_ref().is_some_and(|ctx| ctx.texture_arrays)
    }

    /// Load node textures from `dir`, or only the fallback when `None`.
    ///
    /// Returns how many textures were bound, fallback included.
    pub fn load_textures(&mut self, dir: Option<&Path>) -> anyhow::Result<usize> {
        let images = match dir {
            Some(dir) => load_texture_dir(dir)
                .with_context(|| format!("loading textures from {}", dir.display()))?,
            None => vec![TextureImage::fallback()],
        };
        self.set_textures(&images)?;
        Ok(images.len())
    }

    /// Bind `images` as the node texture array and build the mapblock pipeline.
    ///
    /// Slot `i` of the array is `images[i]`.
    pub fn set_textures(&mut self, images: &[TextureImage]) -> Result<(), RenderError> {
        let context = self.context.as_ref().ok_or(RenderError::NotInitialized)?;
        let gpu = self.gpu.as_mut().ok_or(RenderError::NotInitialized)?;

        if !context.texture_arrays {
            return Err(RenderError::MissingFeatures(
                TEXTURE_ARRAY_FEATURES - context.device.features(),
            ));
        }
        if images.is_empty() {
            return Err(RenderError::NoTextures);
        }
        if images.len() > context.max_textures as usize {
            return Err(RenderError::TooManyTextures {
                count: images.len(),
                max: context.max_textures,
            });
        }

        let textures = NodeTextureArray::new(&context.device, &context.queue, images);
        let pipeline = MapblockPipeline::new(
            &context.device,
            context.config.format,
            gpu.camera_binding.bind_group_layout(),
            textures.bind_group_layout(),
        );
        tracing::info!(count = textures.len(), "Node texture array bound");

        gpu.mapblocks = Some(MapblockResources { textures, pipeline });
        Ok(())
    }

    /// Slot of a bound texture by file name.
    pub fn texture_index(&self, name: &str) -> Option<u32> {
        self.gpu
            .as_ref()?
            .mapblocks
            .as_ref()?
            .textures
            .index_of(name)
    }

    /// Upload (or replace) the mesh for `mesh.blockpos`.
    ///
    /// Once textures are bound, every vertex must name one of their slots.
    pub fn upload_mesh(&mut self, mesh: &MeshData) -> Result<(), RenderError> {
        let context = self.context.as_ref().ok_or(RenderError::NotInitialized)?;
        mesh.validate()?;
        if let Some(mapblocks) = self.gpu.as_ref().and_then(|gpu| gpu.mapblocks.as_ref()) {
            mesh.check_texture_slots(mapblocks.textures.len() as u32)?;
        }

        let gpu_mesh = MapblockMesh::upload(&context.device, mesh);
        tracing::debug!(
            blockpos = %mesh.blockpos,
            indices = gpu_mesh.index_count(),
            "Uploaded mapblock mesh"
        );
        self.meshes.insert(mesh.blockpos, gpu_mesh);
        Ok(())
    }

    /// Drop the mesh for `blockpos`. Returns whether one was present.
    pub fn remove_mesh(&mut self, blockpos: IVec3) -> bool {
        self.meshes.remove(&blockpos).is_some()
    }

    /// Number of resident mapblock meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Access the renderer configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Get mutable reference to the camera.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Get reference to the camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Resize the renderer.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 == 0 || new_size.1 == 0 {
            return;
        }
        self.config.width = new_size.0;
        self.config.height = new_size.1;
        if let Some(context) = &mut self.context {
            context.resize(new_size);
            self.camera.set_aspect(context.aspect_ratio());
            if let Some(gpu) = &mut self.gpu {
                gpu.depth = create_depth_texture(&context.device, new_size);
            }
        }
    }

    /// Render and present one frame.
    pub fn render_frame(&mut self, mode: RenderMode) -> anyhow::Result<FrameStats> {
        let context = self.context.as_ref().ok_or(RenderError::NotInitialized)?;

        let (output, view) = if let Some(surface) = context.surface.as_ref() {
            let output = match surface.get_current_texture() {
                Ok(output) => output,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = context.size;
                    self.resize(size);
                    return Ok(FrameStats::default());
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    tracing::warn!("Surface timed out; skipping frame");
                    return Ok(FrameStats::default());
                }
                Err(err) => return Err(err).context("acquiring surface texture"),
            };
            let view = output
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            (Some(output), view)
        } else {
            let headless = context.headless.as_ref().ok_or(RenderError::NotInitialized)?;
            let view = headless
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            (None, view)
        };

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        let stats = self.encode_frame(&mut encoder, &view, mode)?;
        context.queue.submit(Some(encoder.finish()));

        if let Some(output) = output {
            output.present();
        }
        Ok(stats)
    }

    /// Render one frame offscreen and read it back.
    pub fn capture_frame(&mut self, mode: RenderMode) -> anyhow::Result<FrameCapture> {
        let context = self.context.as_ref().ok_or(RenderError::NotInitialized)?;
        let headless = context
            .headless
            .as_ref()
            .context("frame capture needs a headless renderer")?;

        let view = headless
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });
        let stats = self.encode_frame(&mut encoder, &view, mode)?;
        let pending = FrameCapture::record(&context.device, &mut encoder, &headless.texture)?;
        context.queue.submit(Some(encoder.finish()));

        tracing::debug!(?stats, "Captured frame");
        pending.finish(&context.device)
    }

    fn encode_frame(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        mode: RenderMode,
    ) -> Result<FrameStats, RenderError> {
        let context = self.context.as_ref().ok_or(RenderError::NotInitialized)?;
        let gpu = self.gpu.as_ref().ok_or(RenderError::NotInitialized)?;

        match mode {
            RenderMode::DebugTriangle => {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Debug Triangle Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                gpu.triangle.draw(&mut pass);
                Ok(FrameStats::default())
            }
            RenderMode::Mapblocks => {
                let mapblocks = gpu.mapblocks.as_ref().ok_or(RenderError::NoTextures)?;
                gpu.camera_binding.update(&context.queue, &self.camera);

                let frustum = Frustum::from_camera(&self.camera);
                let mut stats = FrameStats::default();
                let visible: Vec<&MapblockMesh> = self
                    .meshes
                    .values()
                    .filter(|mesh| match mesh.bounds() {
                        Some(bounds) if frustum.intersects_sphere(bounds) => {
                            stats.drawn += 1;
                            true
                        }
                        Some(_) => {
                            stats.culled += 1;
                            false
                        }
                        None => false,
                    })
                    .collect();
                tracing::trace!(drawn = stats.drawn, culled = stats.culled, "Mapblock culling");

                let fog = self.camera.fog_color;
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Mapblock Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: fog.x as f64,
                                g: fog.y as f64,
                                b: fog.z as f64,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &gpu.depth.1,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                mapblocks.pipeline.draw(
                    &mut pass,
                    gpu.camera_binding.bind_group(),
                    mapblocks.textures.bind_group(),
                    visible,
                );
                Ok(stats)
            }
        }
    }
}
