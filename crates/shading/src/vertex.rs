//! Vertex format shared by the mesher and the GPU vertex buffer.

use glam::{Vec2, Vec3, Vec4};

/// Mapblock vertex as produced by the mesher, byte-compatible with the GPU
/// vertex buffer layout.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MapblockVertex {
    /// Position in model space.
    pub position: Vec3,
    /// Texture coordinates.
    pub uv: Vec2,
    /// Axis-aligned unit face normal.
    pub normal: Vec3,
    /// Index into the bound texture array.
    pub texture_index: u32,
}

const _: () = assert!(std::mem::size_of::<MapblockVertex>() == 36);

impl MapblockVertex {
    /// Construct a vertex.
    pub const fn new(position: Vec3, uv: Vec2, normal: Vec3, texture_index: u32) -> Self {
        Self {
            position,
            uv,
            normal,
            texture_index,
        }
    }
}

/// Vertex stage output, delivered per covered pixel to the fragment stage.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexOutput {
    /// Clip-space position.
    pub clip_position: Vec4,
    /// View-space position, only used for the fog distance.
    pub view_position: Vec3,
    /// Texture coordinates.
    pub uv: Vec2,
    /// Face normal.
    pub normal: Vec3,
    /// Texture array index. Never interpolated.
    pub texture_index: u32,
}
