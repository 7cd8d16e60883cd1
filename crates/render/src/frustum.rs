//! View frustum culling for mapblock meshes.

use glam::Vec3;

use crate::camera::Camera;

/// Plane stored as a unit normal and signed distance from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the frustum.
    pub normal: Vec3,
    /// `normal · p` for any point `p` on the plane.
    pub distance: f32,
}

impl Plane {
    /// Plane through `point` with the given (not necessarily unit) normal.
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// Signed distance from `point`; positive on the inside.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// Six inward-facing planes bounding what the camera can see.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Near, far, left, right, top, bottom.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Build the frustum for the camera's current pose and projection.
    pub fn from_camera(camera: &Camera) -> Self {
        let forward = camera.forward();
        let right = camera.right();
        let up = camera.up();

        let half_v = camera.z_far * (camera.fov * 0.5).tan();
        let half_h = half_v * camera.aspect;
        let far_vec = forward * camera.z_far;

        let near = Plane::new(camera.position + forward * camera.near, forward);
        let far = Plane::new(camera.position + far_vec, -forward);
        let left = Plane::new(camera.position, up.cross(far_vec - right * half_h));
        let right_plane = Plane::new(camera.position, (far_vec + right * half_h).cross(up));
        let top = Plane::new(camera.position, right.cross(far_vec + up * half_v));
        let bottom = Plane::new(camera.position, (far_vec - up * half_v).cross(right));

        Self {
            planes: [near, far, left, right_plane, top, bottom],
        }
    }

    /// Whether any part of `sphere` may be visible.
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(sphere.center) >= -sphere.radius)
    }
}

/// Sphere enclosing a mesh, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Centre point.
    pub center: Vec3,
    /// Radius.
    pub radius: f32,
}

impl BoundingSphere {
    /// Smallest sphere around the axis-aligned box `min..max`.
    pub fn from_aabb(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            radius: (max - min).length() * 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at_origin() -> Camera {
        Camera::new(1.0)
    }

    fn unit_sphere(center: Vec3) -> BoundingSphere {
        BoundingSphere {
            center,
            radius: 1.0,
        }
    }

    #[test]
    fn planes_face_inward() {
        let camera = camera_at_origin();
        let frustum = Frustum::from_camera(&camera);
        let inside = Vec3::new(0.0, 0.0, 10.0);

        for plane in frustum.planes {
            assert!(plane.signed_distance(inside) > 0.0, "{plane:?}");
        }
    }

    #[test]
    fn sphere_ahead_is_visible() {
        let frustum = Frustum::from_camera(&camera_at_origin());
        assert!(frustum.intersects_sphere(&unit_sphere(Vec3::new(0.0, 0.0, 20.0))));
    }

    #[test]
    fn sphere_behind_is_culled() {
        let frustum = Frustum::from_camera(&camera_at_origin());
        assert!(!frustum.intersects_sphere(&unit_sphere(Vec3::new(0.0, 0.0, -20.0))));
    }

    #[test]
    fn sphere_beyond_far_plane_is_culled() {
        let camera = camera_at_origin();
        let frustum = Frustum::from_camera(&camera);
        let beyond = Vec3::new(0.0, 0.0, camera.z_far + 5.0);
        assert!(!frustum.intersects_sphere(&unit_sphere(beyond)));
    }

    #[test]
    fn sphere_far_to_the_side_is_culled() {
        let frustum = Frustum::from_camera(&camera_at_origin());
        assert!(!frustum.intersects_sphere(&unit_sphere(Vec3::new(100.0, 0.0, 10.0))));
        assert!(!frustum.intersects_sphere(&unit_sphere(Vec3::new(-100.0, 0.0, 10.0))));
        assert!(!frustum.intersects_sphere(&unit_sphere(Vec3::new(0.0, 100.0, 10.0))));
        assert!(!frustum.intersects_sphere(&unit_sphere(Vec3::new(0.0, -100.0, 10.0))));
    }

    #[test]
    fn sphere_straddling_a_side_plane_is_kept() {
        let camera = camera_at_origin();
        let frustum = Frustum::from_camera(&camera);
        // Right edge of the view at z = 10 sits at x = 10 * tan(fov / 2).
        let edge_x = 10.0 * (camera.fov * 0.5).tan();
        assert!(frustum.intersects_sphere(&unit_sphere(Vec3::new(edge_x + 0.5, 0.0, 10.0))));
    }

    #[test]
    fn frustum_follows_camera_yaw() {
        let mut camera = camera_at_origin();
        camera.rotate(std::f32::consts::PI, 0.0);
        let frustum = Frustum::from_camera(&camera);

        assert!(frustum.intersects_sphere(&unit_sphere(Vec3::new(0.0, 0.0, -20.0))));
        assert!(!frustum.intersects_sphere(&unit_sphere(Vec3::new(0.0, 0.0, 20.0))));
    }

    #[test]
    fn aabb_sphere_covers_corners() {
        let sphere = BoundingSphere::from_aabb(Vec3::ZERO, Vec3::splat(16.0));
        assert_eq!(sphere.center, Vec3::splat(8.0));
        assert!((sphere.radius - 3f32.sqrt() * 8.0).abs() < 1e-4);
    }
}
