//! Distance fog.

use glam::{Vec3, Vec4};

/// Fraction of `z_far` at which fog starts to appear.
pub const FOG_START_RATIO: f32 = 0.8;

/// Cubic Hermite ease between two edges, as WGSL `smoothstep`.
///
/// Returns 0 at or below `edge0`, 1 at or above `edge1` and `3t² − 2t³` of
/// the clamped fraction in between.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Distance at which fog begins for a given far distance.
pub fn fog_start(z_far: f32) -> f32 {
    z_far * FOG_START_RATIO
}

/// Blend weight of the fog colour at `distance` from the camera.
pub fn fog_factor(z_far: f32, distance: f32) -> f32 {
    smoothstep(fog_start(z_far), z_far, distance)
}

/// Blend a shaded colour towards `fog_color` by view-space distance.
///
/// The result is always opaque.
pub fn apply_fog(shaded: Vec3, view_position: Vec3, fog_color: Vec3, z_far: f32) -> Vec4 {
    let factor = fog_factor(z_far, view_position.length());
    shaded.lerp(fog_color, factor).extend(1.0)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn smoothstep_is_cubic_not_linear() {
        assert_eq!(smoothstep(0.0, 1.0, 0.25), 0.15625);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(0.0, 1.0, 0.75), 0.84375);
    }

    #[test]
    fn factor_is_zero_before_fog_start() {
        assert_eq!(fog_factor(100.0, 0.0), 0.0);
        assert_eq!(fog_factor(100.0, 50.0), 0.0);
        assert_eq!(fog_factor(100.0, 80.0), 0.0);
    }

    #[test]
    fn factor_is_one_at_and_beyond_z_far() {
        assert_eq!(fog_factor(100.0, 100.0), 1.0);
        assert_eq!(fog_factor(100.0, 250.0), 1.0);
    }

    #[test]
    fn factor_is_half_in_the_middle_of_the_band() {
        assert!((fog_factor(100.0, 90.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fog_start_keeps_the_unfogged_colour() {
        let shaded = Vec3::new(0.1, 0.2, 0.3);
        let fog_color = Vec3::new(0.8, 0.9, 1.0);
        let at_start = Vec3::new(0.0, 0.0, fog_start(100.0));

        let out = apply_fog(shaded, at_start, fog_color, 100.0);
        assert!(out.abs_diff_eq(shaded.extend(1.0), 1e-6));
    }

    #[test]
    fn beyond_z_far_is_pure_fog() {
        let shaded = Vec3::new(0.1, 0.2, 0.3);
        let fog_color = Vec3::new(0.8, 0.9, 1.0);

        for distance in [100.0, 101.0, 1000.0] {
            let out = apply_fog(shaded, Vec3::new(0.0, distance, 0.0), fog_color, 100.0);
            assert!(out.abs_diff_eq(fog_color.extend(1.0), 1e-6), "distance {distance}");
        }
    }

    #[test]
    fn distance_is_euclidean_not_depth() {
        // |(60, 0, 60)| ≈ 84.85, past the fog start even though z alone is not.
        let out = apply_fog(Vec3::ZERO, Vec3::new(60.0, 0.0, 60.0), Vec3::ONE, 100.0);
        assert!(out.x > 0.0);
    }

    proptest! {
        #[test]
        fn factor_is_monotonic_in_distance(
            z_far in 1.0f32..10_000.0,
            a in 0.0f32..20_000.0,
            b in 0.0f32..20_000.0,
        ) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(fog_factor(z_far, near) <= fog_factor(z_far, far));
        }

        #[test]
        fn factor_stays_in_unit_range(z_far in 1.0f32..10_000.0, distance in 0.0f32..20_000.0) {
            let factor = fog_factor(z_far, distance);
            prop_assert!((0.0..=1.0).contains(&factor));
        }

        #[test]
        fn output_is_always_opaque(
            r in 0.0f32..=1.0,
            g in 0.0f32..=1.0,
            b in 0.0f32..=1.0,
            distance in 0.0f32..500.0,
        ) {
            let out = apply_fog(Vec3::new(r, g, b), Vec3::new(distance, 0.0, 0.0), Vec3::splat(0.5), 200.0);
            prop_assert_eq!(out.w, 1.0);
        }
    }
}
