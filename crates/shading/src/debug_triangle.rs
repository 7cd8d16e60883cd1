//! Hardcoded triangle used to check that a rendering backend is wired up.

use glam::Vec4;

/// Vertices drawn by the debug pass.
pub const DEBUG_TRIANGLE_VERTEX_COUNT: u32 = 3;

/// Clip-space corners: top-middle, bottom-left, bottom-right.
pub const DEBUG_TRIANGLE_POSITIONS: [Vec4; 3] = [
    Vec4::new(0.0, 1.0, 0.0, 1.0),
    Vec4::new(-1.0, -1.0, 0.0, 1.0),
    Vec4::new(1.0, -1.0, 0.0, 1.0),
];

/// Solid red.
pub const DEBUG_TRIANGLE_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

/// Clip-space position for `vertex_index`, or `None` outside `0..3`.
pub fn debug_triangle_position(vertex_index: u32) -> Option<Vec4> {
    DEBUG_TRIANGLE_POSITIONS.get(vertex_index as usize).copied()
}

/// Fragment colour of the debug pass. Independent of position.
pub fn debug_triangle_color(_frag_coord: Vec4) -> Vec4 {
    DEBUG_TRIANGLE_COLOR
}
