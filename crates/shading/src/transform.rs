//! Model space to clip space.

use crate::{CameraUniform, MapblockVertex, VertexOutput};

/// Run the vertex stage for a single mapblock vertex.
///
/// Mapblock positions are already in world coordinates, so the model
/// transform is the identity.
pub fn transform_vertex(camera: &CameraUniform, vertex: &MapblockVertex) -> VertexOutput {
    let position = vertex.position.extend(1.0);

    VertexOutput {
        clip_position: camera.view_proj_matrix() * position,
        view_position: (camera.view_matrix() * position).truncate(),
        uv: vertex.uv,
        normal: vertex.normal,
        texture_index: vertex.texture_index,
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec2, Vec3, Vec4};

    use super::*;

    fn camera() -> CameraUniform {
        let view = Mat4::look_to_lh(Vec3::new(0.0, 0.0, -10.0), Vec3::Z, Vec3::Y);
        let proj = Mat4::perspective_lh(std::f32::consts::PI * 0.4, 1.0, 0.1, 100.0);
        CameraUniform::new(view, proj * view, Vec3::splat(0.7), 100.0)
    }

    #[test]
    fn clip_position_uses_view_projection() {
        let camera = camera();
        let vertex = MapblockVertex::new(Vec3::new(1.0, 2.0, 3.0), Vec2::ZERO, Vec3::Y, 0);

        let out = transform_vertex(&camera, &vertex);
        let expected = camera.view_proj_matrix() * Vec4::new(1.0, 2.0, 3.0, 1.0);

        assert!(out.clip_position.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn view_position_is_camera_relative() {
        let camera = camera();
        let vertex = MapblockVertex::new(Vec3::new(0.0, 0.0, 5.0), Vec2::ZERO, Vec3::Y, 0);

        let out = transform_vertex(&camera, &vertex);

        // Camera sits at z = -10 looking down +Z.
        assert!(out.view_position.abs_diff_eq(Vec3::new(0.0, 0.0, 15.0), 1e-5));
        assert!((out.view_position.length() - 15.0).abs() < 1e-5);
    }

    #[test]
    fn attributes_pass_through_untouched() {
        let camera = camera();
        let vertex = MapblockVertex::new(Vec3::ONE, Vec2::new(0.25, 0.75), Vec3::NEG_X, 17);

        let out = transform_vertex(&camera, &vertex);

        assert_eq!(out.uv, Vec2::new(0.25, 0.75));
        assert_eq!(out.normal, Vec3::NEG_X);
        assert_eq!(out.texture_index, 17);
    }
}
