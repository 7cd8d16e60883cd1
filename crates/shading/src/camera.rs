//! Per-frame camera data shared by the vertex and fragment stages.

use glam::{Mat4, Vec3};

/// Uniform data sent to the GPU once per frame.
///
/// The layout matches `CameraUniform` in `mapblock.wgsl`: two column-major
/// matrices followed by the fog colour and the far fog distance, which share
/// a single 16-byte row.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// World to view space.
    pub view: [[f32; 4]; 4],
    /// World to clip space.
    pub view_proj: [[f32; 4]; 4],
    /// Colour distant geometry fades towards.
    pub fog_color: [f32; 3],
    /// Distance at which fog reaches full strength.
    pub z_far: f32,
}

// WGSL aligns vec3<f32> to 16 bytes; a trailing f32 fills the hole.
const _: () = assert!(std::mem::size_of::<CameraUniform>() == 144);
const _: () = assert!(std::mem::offset_of!(CameraUniform, view_proj) == 64);
const _: () = assert!(std::mem::offset_of!(CameraUniform, fog_color) == 128);
const _: () = assert!(std::mem::offset_of!(CameraUniform, z_far) == 140);

impl CameraUniform {
    /// Pack matrices and fog parameters into uniform layout.
    pub fn new(view: Mat4, view_proj: Mat4, fog_color: Vec3, z_far: f32) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            view_proj: view_proj.to_cols_array_2d(),
            fog_color: fog_color.to_array(),
            z_far,
        }
    }

    /// View matrix as a `glam` matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view)
    }

    /// View-projection matrix as a `glam` matrix.
    pub fn view_proj_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_proj)
    }

    /// Fog colour as a vector.
    pub fn fog_color(&self) -> Vec3 {
        Vec3::from_array(self.fog_color)
    }
}
