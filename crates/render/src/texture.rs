//! Node textures, the bound texture array and the depth buffer.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Depth buffer format shared by all depth-tested pipelines.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Index of the generated fallback texture within every [`NodeTextureArray`].
pub const FALLBACK_TEXTURE_INDEX: u32 = 0;

const FALLBACK_SIZE: u32 = 16;

/// Errors raised while loading node textures from disk.
#[derive(Debug, Error)]
pub enum TextureLoadError {
    /// Could not list or read the texture directory.
    #[error("failed to read texture directory {path}: {source}")]
    Io {
        /// Directory or file that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Image decoding failed.
    #[error("failed to decode texture {path}: {source}")]
    Image {
        /// Image that failed to decode.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },
}

/// CPU-side RGBA8 texture ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    /// Name vertices refer to the texture by (file name for loaded textures).
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 pixels.
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// Decode an image file into RGBA8.
    pub fn load(path: &Path) -> Result<Self, TextureLoadError> {
        let image = image::open(path).map_err(|source| TextureLoadError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Magenta/black checkerboard shown wherever a texture is missing.
    pub fn fallback() -> Self {
        let mut pixels = Vec::with_capacity((FALLBACK_SIZE * FALLBACK_SIZE * 4) as usize);
        for y in 0..FALLBACK_SIZE {
            for x in 0..FALLBACK_SIZE {
                let magenta = ((x / 8) + (y / 8)) % 2 == 0;
                if magenta {
                    pixels.extend_from_slice(&[255, 0, 255, 255]);
                } else {
                    pixels.extend_from_slice(&[0, 0, 0, 255]);
                }
            }
        }

        Self {
            name: "no_texture.png".to_string(),
            width: FALLBACK_SIZE,
            height: FALLBACK_SIZE,
            pixels,
        }
    }

    /// A single-colour texture, handy for tests and debug scenes.
    pub fn solid(name: &str, rgba: [u8; 4]) -> Self {
        Self {
            name: name.to_string(),
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }
}

/// Collect textures from `dir` in file-name order, after the fallback.
///
/// Unreadable images are skipped with a warning so one bad file never takes
/// the whole array down; the mesh producer maps missing names to
/// [`FALLBACK_TEXTURE_INDEX`].
pub fn load_texture_dir(dir: &Path) -> Result<Vec<TextureImage>, TextureLoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| TextureLoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| TextureLoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"));
        if path.is_file() && is_image {
            paths.push(path);
        }
    }
    paths.sort();

    let mut images = vec![TextureImage::fallback()];
    for path in paths {
        match TextureImage::load(&path) {
            Ok(image) => {
                debug!(index = images.len(), name = %image.name, "Loaded node texture");
                images.push(image);
            }
            Err(err) => warn!("Skipping texture: {err}"),
        }
    }

    info!(count = images.len(), dir = %dir.display(), "Loaded node textures");
    Ok(images)
}

/// Textures bound as one `binding_array<texture_2d<f32>>` plus a shared sampler.
pub struct NodeTextureArray {
    names: Vec<String>,
    _textures: Vec<wgpu::Texture>,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl NodeTextureArray {
    /// Upload `images` and build the bind group. Slot order follows `images`.
    ///
    /// `images` must not be empty.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, images: &[TextureImage]) -> Self {
        let textures: Vec<wgpu::Texture> = images
            .iter()
            .map(|image| upload_rgba_texture(device, queue, image))
            .collect();
        let views: Vec<wgpu::TextureView> = textures
            .iter()
            .map(|texture| texture.create_view(&wgpu::TextureViewDescriptor::default()))
            .collect();
        let view_refs: Vec<&wgpu::TextureView> = views.iter().collect();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Node Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest, // Pixel-perfect close up
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let count = NonZeroU32::new(textures.len() as u32).unwrap_or(NonZeroU32::MIN);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Node Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: Some(count),
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Node Texture Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureViewArray(&view_refs),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Self {
            names: images.iter().map(|image| image.name.clone()).collect(),
            _textures: textures,
            bind_group_layout,
            bind_group,
        }
    }

    /// Number of bound textures.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no textures are bound.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Slot of the texture with `name`, if loaded.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| index as u32)
    }

    /// Get the texture bind group layout.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Get the texture bind group.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

fn upload_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &TextureImage,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&image.name),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    // write_texture has no row alignment requirement, unlike buffer copies.
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(image.width * 4),
            rows_per_image: Some(image.height),
        },
        size,
    );

    texture
}

/// Create a depth texture and view matching `size`.
pub fn create_depth_texture(
    device: &wgpu::Device,
    size: (u32, u32),
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Depth Texture View"),
        ..Default::default()
    });

    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(path: &Path, rgba: [u8; 4]) {
        image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba))
            .save(path)
            .unwrap();
    }

    #[test]
    fn fallback_is_a_checkerboard() {
        let fallback = TextureImage::fallback();
        assert_eq!(fallback.pixels.len(), (16 * 16 * 4) as usize);
        assert_eq!(&fallback.pixels[0..4], &[255, 0, 255, 255]);
        let second_cell = (8 * 4) as usize;
        assert_eq!(&fallback.pixels[second_cell..second_cell + 4], &[0, 0, 0, 255]);
    }

    #[test]
    fn directory_textures_follow_fallback_in_name_order() {
        let dir = temp_dir("blockshade_textures");
        write_png(&dir.join("stone.png"), [128, 128, 128, 255]);
        write_png(&dir.join("dirt.png"), [100, 60, 20, 255]);
        std::fs::write(dir.join("readme.txt"), "not a texture").unwrap();

        let images = load_texture_dir(&dir).unwrap();
        let names: Vec<&str> = images.iter().map(|image| image.name.as_str()).collect();
        assert_eq!(names, ["no_texture.png", "dirt.png", "stone.png"]);
        assert_eq!(&images[2].pixels[0..4], &[128, 128, 128, 255]);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn undecodable_texture_is_skipped() {
        let dir = temp_dir("blockshade_bad_textures");
        std::fs::write(dir.join("broken.png"), b"definitely not a png").unwrap();
        write_png(&dir.join("good.png"), [1, 2, 3, 255]);

        let images = load_texture_dir(&dir).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].name, "good.png");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = load_texture_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, TextureLoadError::Io { .. }));
    }
}
