//! Directional face shading derived from the face normal alone.
//!
//! There are no light sources. Each face is darkened by a constant that
//! depends only on which axis it faces, approximating a fixed overhead light.

use glam::Vec3;

/// Tolerance used when deciding whether a normal component is non-zero.
pub const AXIS_EPSILON: f32 = 0.001;

/// Orientation class of a face, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceOrientation {
    /// Faces pointing along +X or -X.
    EastWest,
    /// Faces pointing along +Z or -Z.
    NorthSouth,
    /// Faces pointing along -Y.
    Down,
    /// Faces pointing along +Y, and anything left unclassified.
    Up,
}

impl FaceOrientation {
    /// All orientations in the order [`FaceOrientation::classify`] tests them.
    pub const PRIORITY: [FaceOrientation; 4] = [
        FaceOrientation::EastWest,
        FaceOrientation::NorthSouth,
        FaceOrientation::Down,
        FaceOrientation::Up,
    ];

    /// Classify an (interpolated) face normal.
    ///
    /// First match wins: X before Z before -Y. Normals are expected to be
    /// axis-aligned, so in practice only one condition holds, but skewed
    /// normals still resolve deterministically through this order.
    pub fn classify(normal: Vec3) -> Self {
        if normal.x.abs() > AXIS_EPSILON {
            FaceOrientation::EastWest
        } else if normal.z.abs() > AXIS_EPSILON {
            FaceOrientation::NorthSouth
        } else if normal.y < -AXIS_EPSILON {
            FaceOrientation::Down
        } else {
            FaceOrientation::Up
        }
    }

    /// Colour multiplier applied to faces of this orientation.
    pub const fn multiplier(self) -> f32 {
        match self {
            FaceOrientation::EastWest => 0.6,
            FaceOrientation::NorthSouth => 0.8,
            FaceOrientation::Down => 0.2,
            FaceOrientation::Up => 1.0,
        }
    }

    /// Shade an RGB colour for a face with the given normal.
    pub fn shade(normal: Vec3, rgb: Vec3) -> Vec3 {
        rgb * Self::classify(normal).multiplier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_aligned_normals_map_to_fixed_multipliers() {
        let cases = [
            (Vec3::X, 0.6),
            (Vec3::NEG_X, 0.6),
            (Vec3::Z, 0.8),
            (Vec3::NEG_Z, 0.8),
            (Vec3::NEG_Y, 0.2),
            (Vec3::Y, 1.0),
        ];

        for (normal, expected) in cases {
            assert_eq!(
                FaceOrientation::classify(normal).multiplier(),
                expected,
                "normal {normal:?}"
            );
        }
    }

    #[test]
    fn x_wins_over_z_and_down() {
        let skewed = Vec3::new(0.5, -0.5, 0.5);
        assert_eq!(FaceOrientation::classify(skewed), FaceOrientation::EastWest);
    }

    #[test]
    fn z_wins_over_down() {
        let skewed = Vec3::new(0.0, -0.7, 0.7);
        assert_eq!(FaceOrientation::classify(skewed), FaceOrientation::NorthSouth);
    }

    #[test]
    fn components_within_tolerance_are_ignored() {
        let almost_up = Vec3::new(0.0005, 0.999, -0.0009);
        assert_eq!(FaceOrientation::classify(almost_up), FaceOrientation::Up);

        let almost_down = Vec3::new(-0.0009, -0.999, 0.0005);
        assert_eq!(FaceOrientation::classify(almost_down), FaceOrientation::Down);
    }

    #[test]
    fn zero_normal_is_treated_as_up() {
        assert_eq!(FaceOrientation::classify(Vec3::ZERO), FaceOrientation::Up);
    }

    #[test]
    fn shade_scales_every_channel() {
        let shaded = FaceOrientation::shade(Vec3::NEG_Y, Vec3::new(1.0, 0.5, 0.25));
        assert!(shaded.abs_diff_eq(Vec3::new(0.2, 0.1, 0.05), 1e-6));
    }

    #[test]
    fn priority_order_matches_classification() {
        let representatives = [Vec3::X, Vec3::Z, Vec3::NEG_Y, Vec3::Y];
        for (normal, expected) in representatives.into_iter().zip(FaceOrientation::PRIORITY) {
            assert_eq!(FaceOrientation::classify(normal), expected);
        }
    }
}
