//! # Foot path interpolation
//!
//! Gives the position of a foot along its path between two points, for a
//! progress `t` in `[0, T_MAX]`. Every shape starts exactly at the start point
//! and ends exactly at the destination.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use crate::geometry::{Point3, LIMB_LIFT_HEIGHT_MM};
use util::maths::get_ang_dist_2pi;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Progress value at the end of a path.
pub const T_MAX: f64 = 180.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Shape of the path followed by a foot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathShape {
    /// Straight line.
    Linear,

    /// Arc around the leg's vertical axis, height changing linearly.
    ArcYLinear,

    /// Arc around the leg's vertical axis with the foot lifted on the way.
    ///
    /// The height changes linearly plus a `LIMB_LIFT_HEIGHT_MM * sin(t)` hump,
    /// so the lift is fixed and does not come from the gait table.
    ArcYSinus,

    /// Half ellipse in the vertical plane, the swing of a walking step.
    ///
    /// Every axis moves by `(1 - cos(t)) / 2` of its travel and the foot is
    /// lifted by the same fixed `LIMB_LIFT_HEIGHT_MM * sin(t)` hump as
    /// `ArcYSinus`.
    EllipticalYSinus,
}

impl Default for PathShape {
    fn default() -> Self {
        PathShape::Linear
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Position on the path from `p0` to `p1` at progress `t`.
///
/// `t` is clamped to `[0, T_MAX]`.
pub fn interpolate(p0: &Point3, p1: &Point3, shape: PathShape, t: f64) -> Point3 {
    let t = t.max(0.0).min(T_MAX);
    let ratio = t / T_MAX;

    // The sinusoidal profiles use the progress as an angle in degrees
    let t_rad = t.to_radians();
    let lift = LIMB_LIFT_HEIGHT_MM * t_rad.sin();

    match shape {
        PathShape::Linear => Point3 {
            x: p0.x + (p1.x - p0.x) * ratio,
            y: p0.y + (p1.y - p0.y) * ratio,
            z: p0.z + (p1.z - p0.z) * ratio,
        },
        PathShape::ArcYLinear => {
            let mut p = arc(p0, p1, ratio);
            p.y = p0.y + (p1.y - p0.y) * ratio;
            p
        },
        PathShape::ArcYSinus => {
            let mut p = arc(p0, p1, ratio);
            p.y = p0.y + (p1.y - p0.y) * ratio + lift;
            p
        },
        PathShape::EllipticalYSinus => {
            // Half of the ellipse's horizontal axis is travelled as
            // (1 - cos(t)) / 2, i.e. z = a cos(T_MAX - t) + z0 + a
            let e = (1.0 - t_rad.cos()) / 2.0;
            Point3 {
                x: p0.x + (p1.x - p0.x) * e,
                y: p0.y + (p1.y - p0.y) * e + lift,
                z: p0.z + (p1.z - p0.z) * e,
            }
        },
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Horizontal position on the arc from `p0` to `p1`, taking the short way
/// round the leg's vertical axis. The radius changes linearly along the arc.
fn arc(p0: &Point3, p1: &Point3, ratio: f64) -> Point3 {
    let r0 = p0.radius();
    let r1 = p1.radius();
    let theta0 = p0.polar_angle_rad();
    let theta1 = p1.polar_angle_rad();

    let radius = r0 + (r1 - r0) * ratio;
    let theta = theta0 + get_ang_dist_2pi(theta0, theta1) * ratio;

    Point3 {
        x: radius * theta.sin(),
        y: 0.0,
        z: radius * theta.cos(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const SHAPES: [PathShape; 4] = [
        PathShape::Linear,
        PathShape::ArcYLinear,
        PathShape::ArcYSinus,
        PathShape::EllipticalYSinus,
    ];

    #[test]
    fn test_endpoints() {
        let pairs = [
            (Point3::new(88.4, -85.0, 88.4), Point3::new(77.8, -55.0, 98.9)),
            (Point3::new(125.0, -100.0, 15.0), Point3::new(125.0, -100.0, -15.0)),
            (Point3::new(-40.0, -20.0, -110.0), Point3::new(60.0, -120.0, 30.0)),
            // Arc crossing the +/-180 deg seam behind the leg
            (Point3::new(10.0, -90.0, -120.0), Point3::new(-10.0, -90.0, -120.0)),
        ];

        for (p0, p1) in pairs.iter() {
            for shape in SHAPES.iter() {
                let start = interpolate(p0, p1, *shape, 0.0);
                let end = interpolate(p0, p1, *shape, T_MAX);
                assert!(start.approx_eq(p0, 1e-3), "{:?} start {} != {}", shape, start, p0);
                assert!(end.approx_eq(p1, 1e-3), "{:?} end {} != {}", shape, end, p1);
            }
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let p = interpolate(
            &Point3::new(0.0, -80.0, 10.0),
            &Point3::new(20.0, -60.0, -10.0),
            PathShape::Linear,
            T_MAX / 2.0
        );
        assert!(p.approx_eq(&Point3::new(10.0, -70.0, 0.0), 1e-9));
    }

    #[test]
    fn test_swing_lifts_foot() {
        let p0 = Point3::new(125.0, -90.0, -15.0);
        let p1 = Point3::new(125.0, -90.0, 15.0);

        let mid = interpolate(&p0, &p1, PathShape::EllipticalYSinus, T_MAX / 2.0);
        assert!((mid.y - (-90.0 + LIMB_LIFT_HEIGHT_MM)).abs() < 1e-9);
        assert!(mid.z.abs() < 1e-9);

        // The foot never goes below the ground on the way
        for step in 0..=18 {
            let p = interpolate(&p0, &p1, PathShape::EllipticalYSinus, step as f64 * 10.0);
            assert!(p.y >= -90.0 - 1e-9);
        }
    }

    #[test]
    fn test_arc_keeps_radius() {
        let p0 = Point3::from_polar(125.0, 80.0, -90.0);
        let p1 = Point3::from_polar(125.0, 100.0, -90.0);

        for step in 0..=18 {
            let t = step as f64 * 10.0;
            let flat = interpolate(&p0, &p1, PathShape::ArcYLinear, t);
            assert!((flat.radius() - 125.0).abs() < 1e-9);
            assert!((flat.y + 90.0).abs() < 1e-9);

            let lifted = interpolate(&p0, &p1, PathShape::ArcYSinus, t);
            assert!((lifted.radius() - 125.0).abs() < 1e-9);
            assert!(lifted.y >= -90.0 - 1e-9);
        }

        let mid = interpolate(&p0, &p1, PathShape::ArcYLinear, T_MAX / 2.0);
        assert!((mid.polar_angle_rad().to_degrees() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_sinus_profiles() {
        // Start and end heights differ, the hump sits on top of the linear change
        let p0 = Point3::from_polar(125.0, 80.0, -90.0);
        let p1 = Point3::from_polar(110.0, 100.0, -60.0);

        let mid = interpolate(&p0, &p1, PathShape::ArcYSinus, T_MAX / 2.0);
        assert!((mid.y - (-75.0 + LIMB_LIFT_HEIGHT_MM)).abs() < 1e-9);
        assert!((mid.radius() - 117.5).abs() < 1e-9);
        assert!((mid.polar_angle_rad().to_degrees() - 90.0).abs() < 1e-9);

        // A quarter of the way through the swing
        let p0 = Point3::new(110.0, -90.0, 15.0);
        let p1 = Point3::new(130.0, -80.0, -15.0);
        let t = T_MAX / 4.0;
        let e = (1.0 - t.to_radians().cos()) / 2.0;
        let lift = LIMB_LIFT_HEIGHT_MM * t.to_radians().sin();

        let p = interpolate(&p0, &p1, PathShape::EllipticalYSinus, t);
        let expected = Point3::new(110.0 + 20.0 * e, -90.0 + 10.0 * e + lift, 15.0 - 30.0 * e);
        assert!(p.approx_eq(&expected, 1e-9), "{} != {}", p, expected);

        // Half way every axis has covered half its travel
        let mid = interpolate(&p0, &p1, PathShape::EllipticalYSinus, T_MAX / 2.0);
        assert!(mid.approx_eq(&Point3::new(120.0, -85.0 + LIMB_LIFT_HEIGHT_MM, 0.0), 1e-9));
    }

    #[test]
    fn test_progress_is_clamped() {
        let p0 = Point3::new(0.0, 0.0, 0.0);
        let p1 = Point3::new(10.0, 10.0, 10.0);
        assert_eq!(interpolate(&p0, &p1, PathShape::Linear, -5.0), p0);
        assert!(interpolate(&p0, &p1, PathShape::Linear, T_MAX + 5.0).approx_eq(&p1, 1e-9));
    }
}
