//! Texture indirection: a per-vertex index selects one texture out of a bound
//! array, all sampled through one shared sampler.

use glam::{Vec2, Vec4};

/// A bound array of textures sampled with a single shared sampler.
///
/// `index` comes straight from vertex data and is not validated. Keeping it
/// within `0..len()` is the mesh producer's job; implementations may panic or
/// return garbage for anything else.
pub trait TextureArray {
    /// Number of populated slots.
    fn len(&self) -> usize;

    /// Whether the array has no textures at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample texture `index` at `uv`, returning RGBA in `[0, 1]`.
    fn sample(&self, index: u32, uv: Vec2) -> Vec4;
}

/// CPU-side texture with nearest filtering and repeat addressing.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftwareTexture {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
}

impl SoftwareTexture {
    /// Build from tightly packed RGBA8 pixels, row-major with the origin at
    /// the top-left. Channels are normalised without any colour-space
    /// conversion.
    ///
    /// Returns `None` if the pixel buffer does not match the dimensions,
    /// including dimensions too large to address.
    pub fn from_rgba8(width: u32, height: u32, pixels: &[u8]) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if width == 0 || height == 0 || pixels.len() != expected {
            return None;
        }

        let texels = pixels
            .chunks_exact(4)
            .map(|p| Vec4::new(p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32) / 255.0)
            .collect();

        Some(Self {
            width,
            height,
            texels,
        })
    }

    /// A 1×1 texture of a single colour.
    pub fn solid(color: Vec4) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
        }
    }

    /// Texture dimensions in texels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sample the texel covering `uv`, wrapping coordinates outside `[0, 1)`.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let x = wrap_texel(uv.x, self.width);
        let y = wrap_texel(uv.y, self.height);
        self.texels[(y * self.width + x) as usize]
    }
}

fn wrap_texel(coord: f32, extent: u32) -> u32 {
    let texel = (coord.rem_euclid(1.0) * extent as f32).floor() as u32;
    texel.min(extent - 1)
}

/// Texture array backed by [`SoftwareTexture`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftwareTextureArray {
    textures: Vec<SoftwareTexture>,
}

impl SoftwareTextureArray {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a texture, returning the index vertices should use for it.
    pub fn push(&mut self, texture: SoftwareTexture) -> u32 {
        self.textures.push(texture);
        (self.textures.len() - 1) as u32
    }
}

impl From<Vec<SoftwareTexture>> for SoftwareTextureArray {
    fn from(textures: Vec<SoftwareTexture>) -> Self {
        Self { textures }
    }
}

impl TextureArray for SoftwareTextureArray {
    fn len(&self) -> usize {
        self.textures.len()
    }

    fn sample(&self, index: u32, uv: Vec2) -> Vec4 {
        self.textures[index as usize].sample(uv)
    }
}
