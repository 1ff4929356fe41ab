//! Vertex angle between two body segments.

use crate::domain::Landmark;

/// 射線長度低於此值視為重合點
const MIN_RAY_LENGTH: f64 = 1e-9;

/// Angle in degrees at `vertex` between the rays `vertex→a` and `vertex→c`.
///
/// The result lies in `[0, 180]` and does not depend on which side is passed
/// as `a` or `c`. Returns `None` when a point is missing or when the angle is
/// undefined (a ray of zero length, non-finite coordinates); callers treat
/// that as inconclusive.
pub fn joint_angle(
    a: Option<&Landmark>,
    vertex: Option<&Landmark>,
    c: Option<&Landmark>,
) -> Option<f32> {
    let (a, b, c) = (a?, vertex?, c?);

    let ray_a = (f64::from(a.x) - f64::from(b.x), f64::from(a.y) - f64::from(b.y));
    let ray_c = (f64::from(c.x) - f64::from(b.x), f64::from(c.y) - f64::from(b.y));

    let len_a = ray_a.0.hypot(ray_a.1);
    let len_c = ray_c.0.hypot(ray_c.1);
    let usable = |len: f64| len.is_finite() && len >= MIN_RAY_LENGTH;
    if !(usable(len_a) && usable(len_c)) {
        return None;
    }

    let radians = ray_c.1.atan2(ray_c.0) - ray_a.1.atan2(ray_a.0);
    let mut degrees = radians.abs().to_degrees();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }

    degrees.is_finite().then_some(degrees as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lm(x: f32, y: f32) -> Landmark {
        Landmark::new(x, y, 1.0)
    }

    #[test]
    fn test_straight_line_is_180() {
        let angle = joint_angle(Some(&lm(0.0, 0.5)), Some(&lm(0.5, 0.5)), Some(&lm(1.0, 0.5)));
        assert!((angle.unwrap() - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle(Some(&lm(0.5, 0.0)), Some(&lm(0.5, 0.5)), Some(&lm(1.0, 0.5)));
        assert!((angle.unwrap() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_reflex_difference_is_folded() {
        // 兩射線跨越 ±180°，atan2 差值約 345.75°，折回約 14.25°
        let angle = joint_angle(Some(&lm(0.1, 0.55)), Some(&lm(0.5, 0.5)), Some(&lm(0.1, 0.45)));
        let expected = 2.0 * (0.05_f32 / 0.4).atan().to_degrees();
        assert!((angle.unwrap() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_symmetric_under_swap() {
        let a = lm(0.12, 0.83);
        let b = lm(0.47, 0.41);
        let c = lm(0.91, 0.66);

        let forward = joint_angle(Some(&a), Some(&b), Some(&c));
        let backward = joint_angle(Some(&c), Some(&b), Some(&a));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_range_over_many_orientations() {
        let vertex = lm(0.5, 0.5);
        for i in 0..72 {
            for j in 0..72 {
                let ta = (i as f32 * 5.0).to_radians();
                let tc = (j as f32 * 5.0 + 2.5).to_radians();
                let a = lm(0.5 + 0.3 * ta.cos(), 0.5 + 0.3 * ta.sin());
                let c = lm(0.5 + 0.2 * tc.cos(), 0.5 + 0.2 * tc.sin());
                let angle = joint_angle(Some(&a), Some(&vertex), Some(&c)).unwrap();
                assert!((0.0..=180.0).contains(&angle), "angle {} out of range", angle);
            }
        }
    }

    #[test]
    fn test_missing_point_is_none() {
        let p = lm(0.5, 0.5);
        assert_eq!(joint_angle(None, Some(&p), Some(&p)), None);
        assert_eq!(joint_angle(Some(&p), None, Some(&p)), None);
        assert_eq!(joint_angle(Some(&p), Some(&p), None), None);
    }

    #[test]
    fn test_coincident_points_are_none() {
        let vertex = lm(0.5, 0.5);
        assert_eq!(
            joint_angle(Some(&vertex), Some(&vertex), Some(&lm(0.9, 0.9))),
            None
        );
    }

    #[test]
    fn test_non_finite_coordinates_are_none() {
        let vertex = lm(0.5, 0.5);
        assert_eq!(
            joint_angle(Some(&lm(f32::NAN, 0.1)), Some(&vertex), Some(&lm(0.9, 0.9))),
            None
        );
        assert_eq!(
            joint_angle(Some(&lm(f32::INFINITY, 0.1)), Some(&vertex), Some(&lm(0.9, 0.9))),
            None
        );
    }
}
