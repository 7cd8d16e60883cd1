//! GPU device, queue and presentation target.

use anyhow::{Context, Result};
use winit::window::Window;

/// Features needed to index a texture binding array per fragment.
pub const TEXTURE_ARRAY_FEATURES: wgpu::Features = wgpu::Features::TEXTURE_BINDING_ARRAY
    .union(wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING);

/// Offscreen colour target used when rendering without a window.
pub struct HeadlessTarget {
    /// Texture rendered into; supports copying out for readback.
    pub texture: wgpu::Texture,
}

/// GPU rendering context.
pub struct RenderContext {
    /// Window surface the renderer presents into (windowed only).
    pub surface: Option<wgpu::Surface<'static>>,
    /// Offscreen target (headless only).
    pub headless: Option<HeadlessTarget>,
    /// Logical GPU device used for issuing commands.
    pub device: wgpu::Device,
    /// Command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
    /// Target configuration. For headless contexts only format and size are meaningful.
    pub config: wgpu::SurfaceConfiguration,
    /// Current backbuffer dimensions in pixels (width, height).
    pub size: (u32, u32),
    /// Whether the device was created with [`TEXTURE_ARRAY_FEATURES`].
    pub texture_arrays: bool,
    /// How many textures a single binding array may hold on this device.
    pub max_textures: u32,
}

impl RenderContext {
    /// Create a new render context from a window.
    pub async fn new(window: std::sync::Arc<Window>, vsync: bool) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find suitable GPU adapter")?;

        let device = DeviceSetup::request(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device.device, &config);

        tracing::info!(
            width = config.width,
            height = config.height,
            format = ?surface_format,
            texture_arrays = device.texture_arrays,
            "GPU rendering context initialized"
        );

        Ok(Self {
            surface: Some(surface),
            headless: None,
            device: device.device,
            queue: device.queue,
            size: (config.width, config.height),
            config,
            texture_arrays: device.texture_arrays,
            max_textures: device.max_textures,
        })
    }

    /// Create a context that renders into an offscreen texture.
    pub async fn new_headless(size: (u32, u32), format: wgpu::TextureFormat) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Some(adapter) => adapter,
            None => instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::LowPower,
                    compatible_surface: None,
                    force_fallback_adapter: true,
                })
                .await
                .context("Failed to find any GPU adapter (including fallback)")?,
        };

        let device = DeviceSetup::request(&adapter).await?;

        let size = (size.0.max(1), size.1.max(1));
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format,
            width: size.0,
            height: size.1,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let texture = create_headless_texture(&device.device, &config);

        tracing::info!(
            width = size.0,
            height = size.1,
            ?format,
            texture_arrays = device.texture_arrays,
            "Headless rendering context initialized"
        );

        Ok(Self {
            surface: None,
            headless: Some(HeadlessTarget { texture }),
            device: device.device,
            queue: device.queue,
            config,
            size,
            texture_arrays: device.texture_arrays,
            max_textures: device.max_textures,
        })
    }

    /// Resize the presentation target. Zero-sized requests are ignored.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 == 0 || new_size.1 == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.0;
        self.config.height = new_size.1;
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
        if let Some(headless) = &mut self.headless {
            headless.texture = create_headless_texture(&self.device, &self.config);
        }
    }

    /// Get current aspect ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.size.0 as f32 / self.size.1 as f32
    }
}

struct DeviceSetup {
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture_arrays: bool,
    max_textures: u32,
}

impl DeviceSetup {
    /// Request a device, opting into texture binding arrays when available.
    async fn request(adapter: &wgpu::Adapter) -> Result<Self> {
        let texture_arrays = adapter.features().contains(TEXTURE_ARRAY_FEATURES);
        let adapter_limits = adapter.limits();

        let (required_features, required_limits) = if texture_arrays {
            (
                TEXTURE_ARRAY_FEATURES,
                wgpu::Limits {
                    max_sampled_textures_per_shader_stage: adapter_limits
                        .max_sampled_textures_per_shader_stage,
                    ..wgpu::Limits::default().using_resolution(adapter_limits.clone())
                },
            )
        } else {
            tracing::warn!(
                adapter = ?adapter.get_info().name,
                "Adapter lacks texture binding arrays; only the debug triangle can be drawn"
            );
            (
                wgpu::Features::empty(),
                wgpu::Limits::downlevel_defaults().using_resolution(adapter_limits.clone()),
            )
        };

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("blockshade device"),
                    required_features,
                    required_limits: required_limits.clone(),
                },
                None,
            )
            .await
            .context("Failed to create GPU device")?;

        Ok(Self {
            device,
            queue,
            texture_arrays,
            max_textures: required_limits.max_sampled_textures_per_shader_stage,
        })
    }
}

fn create_headless_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Headless Color Target"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: config.usage,
        view_formats: &[],
    })
}
