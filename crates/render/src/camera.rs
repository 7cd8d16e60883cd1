//! First-person camera and its GPU uniform binding.

use blockshade_shading::CameraUniform;
use glam::{Mat4, Vec3};

/// First-person camera for mapblock rendering.
///
/// Uses a left-handed coordinate system with +Y up; yaw 0 looks along +Z.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Rotation around the Y axis in radians
    pub yaw: f32,
    /// Rotation above/below the horizon in radians
    pub pitch: f32,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Aspect ratio (width/height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane, also where fog becomes opaque
    pub z_far: f32,
    /// Colour distant geometry fades into
    pub fog_color: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            fov: std::f32::consts::PI * 0.4, // 72 degrees
            aspect,
            near: 0.1,
            z_far: 160.0,
            fog_color: Vec3::new(0.6, 0.75, 0.95),
        }
    }

    /// Get the forward direction vector.
    pub fn forward(&self) -> Vec3 {
        let (yaw_sin, yaw_cos) = self.yaw.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.sin_cos();
        Vec3::new(yaw_sin * pitch_cos, pitch_sin, yaw_cos * pitch_cos).normalize()
    }

    /// Get the right direction vector.
    pub fn right(&self) -> Vec3 {
        Vec3::Y.cross(self.forward()).normalize()
    }

    /// Get the up direction vector.
    pub fn up(&self) -> Vec3 {
        self.forward().cross(self.right()).normalize()
    }

    /// Build the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_lh(self.position, self.forward(), Vec3::Y)
    }

    /// Build the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov, self.aspect, self.near, self.z_far)
    }

    /// Build combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Pack the camera into the per-frame uniform.
    pub fn uniform(&self) -> CameraUniform {
        CameraUniform::new(
            self.view_matrix(),
            self.view_projection_matrix(),
            self.fog_color,
            self.z_far,
        )
    }

    /// Update aspect ratio (call when window resizes).
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Move the camera by a direction vector.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Rotate the camera by yaw/pitch deltas.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw = (self.yaw + yaw_delta).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + pitch_delta).clamp(
            -std::f32::consts::FRAC_PI_2 + 0.001,
            std::f32::consts::FRAC_PI_2 - 0.001,
        );
    }
}

/// GPU buffer + bind group carrying the [`CameraUniform`].
///
/// Bound at group 0 and visible to both shader stages, since the fragment
/// stage reads the fog parameters.
pub struct CameraBinding {
    buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    /// Allocate the uniform buffer and its bind group.
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<CameraUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group_layout,
            bind_group,
        }
    }

    /// Write this frame's camera into the uniform buffer.
    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera) {
        let uniform = camera.uniform();
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Get the camera bind group.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Get the camera bind group layout.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_directions() {
        let camera = Camera::new(16.0 / 9.0);

        // Default camera looks along +Z with +X to its right.
        assert!(camera.forward().abs_diff_eq(Vec3::Z, 1e-5));
        assert!(camera.right().abs_diff_eq(Vec3::X, 1e-5));
        assert!(camera.up().abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn test_camera_rotation() {
        let mut camera = Camera::new(16.0 / 9.0);

        // Pitch clamps short of straight up/down
        camera.rotate(0.0, std::f32::consts::PI);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);

        camera.rotate(0.0, -std::f32::consts::PI * 2.0);
        assert!(camera.pitch > -std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_view_projection_matrix() {
        let camera = Camera::new(16.0 / 9.0);
        let vp = camera.view_projection_matrix();

        // Matrix should be invertible
        assert!(vp.determinant().abs() > 0.0);
    }

    #[test]
    fn point_ahead_projects_inside_clip_volume() {
        let camera = Camera::new(1.0);
        let clip = camera.view_projection_matrix() * Vec3::new(0.0, 0.0, 10.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn uniform_carries_fog_parameters() {
        let mut camera = Camera::new(1.0);
        camera.z_far = 250.0;
        camera.fog_color = Vec3::new(0.1, 0.2, 0.3);

        let uniform = camera.uniform();
        assert_eq!(uniform.z_far, 250.0);
        assert_eq!(uniform.fog_color, [0.1, 0.2, 0.3]);
        assert_eq!(uniform.view_matrix(), camera.view_matrix());
    }
}
