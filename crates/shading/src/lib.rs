#![warn(missing_docs)]
//! Reference implementation of the mapblock shading model.
//!
//! Every function here mirrors a stage of `mapblock.wgsl` / `triangle.wgsl`
//! in the render crate and is the executable statement of their numeric
//! behaviour. The GPU shaders and these functions must stay in lockstep.

mod camera;
mod debug_triangle;
mod face;
mod fog;
mod fragment;
mod texture;
mod transform;
mod vertex;

pub use camera::CameraUniform;
pub use debug_triangle::{
    debug_triangle_color, debug_triangle_position, DEBUG_TRIANGLE_COLOR,
    DEBUG_TRIANGLE_POSITIONS, DEBUG_TRIANGLE_VERTEX_COUNT,
};
pub use face::{FaceOrientation, AXIS_EPSILON};
pub use fog::{apply_fog, fog_factor, fog_start, smoothstep, FOG_START_RATIO};
pub use fragment::{alpha_cutout, shade_fragment};
pub use texture::{SoftwareTexture, SoftwareTextureArray, TextureArray};
pub use transform::transform_vertex;
pub use vertex::{MapblockVertex, VertexOutput};
