//! Fragment stage: texture indirection, alpha cutout, face shading, fog.

use glam::{Vec3, Vec4};

use crate::{apply_fog, CameraUniform, FaceOrientation, TextureArray, VertexOutput};

/// Decide whether a sampled texel is drawn at all.
///
/// Only an alpha of exactly `0.0` discards. Any other alpha, however small,
/// keeps the fragment and the alpha itself is dropped: output is opaque.
pub fn alpha_cutout(sample: Vec4) -> Option<Vec3> {
    // Exact comparison, not a threshold.
    if sample.w == 0.0 {
        None
    } else {
        Some(sample.truncate())
    }
}

/// Run the full mapblock fragment stage for one covered pixel.
///
/// Returns `None` for discarded fragments, which write neither colour nor
/// depth. Discard is decided before any shading or fog work happens.
pub fn shade_fragment<T: TextureArray + ?Sized>(
    camera: &CameraUniform,
    textures: &T,
    input: &VertexOutput,
) -> Option<Vec4> {
    let sample = textures.sample(input.texture_index, input.uv);
    let rgb = alpha_cutout(sample)?;
    let shaded = FaceOrientation::shade(input.normal, rgb);

    Some(apply_fog(
        shaded,
        input.view_position,
        camera.fog_color(),
        camera.z_far,
    ))
}
