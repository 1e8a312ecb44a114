//! # Leg inverse kinematics
//!
//! Converts a foot target in a leg frame into coxa, femur and tibia angles.
//!
//! The target is first rotated about the vertical axis by the coxa zero
//! rotation, which gives the coxa angle directly. The remaining two joints form
//! a planar two-link arm in the plane of the leg, solved with the law of
//! cosines:
//!
//! ```text
//!   femur = femur_zero - alpha - atan2(y, h)
//!   tibia = gamma - tibia_zero
//! ```
//!
//! where `h` is the horizontal distance from the femur joint, `alpha` the
//! angle at the femur joint and `gamma` the angle at the tibia joint of the
//! femur/tibia/target triangle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::geometry::{Joint, Point3};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Calibration of a single link and the joint driving it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkCalibration {
    /// Length of the link.
    ///
    /// Units: millimeters
    pub length_mm: f64,

    /// Joint angle at which the link is in its reference position.
    ///
    /// Units: degrees
    pub zero_rotate_deg: f64,

    /// Units: degrees
    pub min_angle_deg: f64,

    /// Units: degrees
    pub max_angle_deg: f64,
}

/// Calibration of one leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LegCalibration {
    pub coxa: LinkCalibration,
    pub femur: LinkCalibration,
    pub tibia: LinkCalibration,
}

/// Joint angles of one leg.
///
/// Units: degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub coxa_deg: f64,
    pub femur_deg: f64,
    pub tibia_deg: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a target cannot be reached by a leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Error)]
pub enum IkError {
    #[error(
        "Target is {distance_mm:.3} mm from the femur joint but the leg only reaches \
        {reach_mm:.3} mm"
    )]
    Unreachable { distance_mm: f64, reach_mm: f64 },

    #[error("{joint} angle {angle_deg:.3} deg is outside [{min_deg}, {max_deg}]")]
    OutOfRange {
        joint: Joint,
        angle_deg: f64,
        min_deg: f64,
        max_deg: f64,
    },
}

/// Invalid calibration values.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CalibrationError {
    #[error("{0} calibration contains a non-finite value")]
    NonFinite(Joint),

    #[error("{0} length must be positive, found {1} mm")]
    NonPositiveLength(Joint, f64),

    #[error("{0} minimum angle ({1} deg) is above its maximum angle ({2} deg)")]
    InvertedLimits(Joint, f64, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LinkCalibration {
    fn validate(&self, joint: Joint) -> Result<(), CalibrationError> {
        let values = [
            self.length_mm,
            self.zero_rotate_deg,
            self.min_angle_deg,
            self.max_angle_deg,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFinite(joint));
        }
        if self.length_mm <= 0.0 {
            return Err(CalibrationError::NonPositiveLength(joint, self.length_mm));
        }
        if self.min_angle_deg > self.max_angle_deg {
            return Err(CalibrationError::InvertedLimits(
                joint,
                self.min_angle_deg,
                self.max_angle_deg,
            ));
        }
        Ok(())
    }
}

impl LegCalibration {
    pub fn link(&self, joint: Joint) -> &LinkCalibration {
        match joint {
            Joint::Coxa => &self.coxa,
            Joint::Femur => &self.femur,
            Joint::Tibia => &self.tibia,
        }
    }

    /// Check that every link has a positive length and ordered limits.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        for joint in Joint::ALL.iter() {
            self.link(*joint).validate(*joint)?;
        }
        Ok(())
    }

    /// Furthest distance from the femur joint the foot can reach.
    ///
    /// Units: millimeters
    pub fn reach_mm(&self) -> f64 {
        self.femur.length_mm + self.tibia.length_mm
    }
}

impl JointAngles {
    pub fn get(&self, joint: Joint) -> f64 {
        match joint {
            Joint::Coxa => self.coxa_deg,
            Joint::Femur => self.femur_deg,
            Joint::Tibia => self.tibia_deg,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the joint angles placing the foot of a leg at `target`.
pub fn solve(target: &Point3, calib: &LegCalibration) -> Result<JointAngles, IkError> {
    // Rotate into the coxa reference frame
    let zero_rad = calib.coxa.zero_rotate_deg.to_radians();
    let x = target.x * zero_rad.cos() + target.z * zero_rad.sin();
    let z = -target.x * zero_rad.sin() + target.z * zero_rad.cos();
    let y = target.y;

    let coxa_rad = z.atan2(x);

    // Position of the target relative to the femur joint, in the leg plane
    let horizontal_mm = x * coxa_rad.cos() + z * coxa_rad.sin() - calib.coxa.length_mm;
    let distance_mm = horizontal_mm.hypot(y);

    let reach_mm = calib.reach_mm();
    if distance_mm > reach_mm {
        return Err(IkError::Unreachable { distance_mm, reach_mm });
    }

    let a = calib.tibia.length_mm;
    let b = calib.femur.length_mm;
    let c = distance_mm;

    // Rounding can push the cosines just outside [-1, 1] at full extension
    let alpha_rad = clamp(&((b * b + c * c - a * a) / (2.0 * b * c)), &-1.0, &1.0).acos();
    let gamma_rad = clamp(&((a * a + b * b - c * c) / (2.0 * a * b)), &-1.0, &1.0).acos();
    let fi_rad = y.atan2(horizontal_mm);

    let angles = JointAngles {
        coxa_deg: coxa_rad.to_degrees(),
        femur_deg: calib.femur.zero_rotate_deg - alpha_rad.to_degrees() - fi_rad.to_degrees(),
        tibia_deg: gamma_rad.to_degrees() - calib.tibia.zero_rotate_deg,
    };

    for joint in Joint::ALL.iter() {
        check_angle(*joint, angles.get(*joint), calib.link(*joint))?;
    }

    Ok(angles)
}

/// Check a joint angle against the link's limits, bounds inclusive.
pub fn check_angle(joint: Joint, angle_deg: f64, link: &LinkCalibration) -> Result<(), IkError> {
    // NaN fails both comparisons, so test for the accepted range explicitly
    if angle_deg >= link.min_angle_deg && angle_deg <= link.max_angle_deg {
        Ok(())
    }
    else {
        Err(IkError::OutOfRange {
            joint,
            angle_deg,
            min_deg: link.min_angle_deg,
            max_deg: link.max_angle_deg,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn link(length_mm: f64, zero_rotate_deg: f64, min: f64, max: f64) -> LinkCalibration {
        LinkCalibration {
            length_mm,
            zero_rotate_deg,
            min_angle_deg: min,
            max_angle_deg: max,
        }
    }

    /// Leg with the production link lengths and no joint limits.
    fn unlimited_leg(coxa_zero_deg: f64) -> LegCalibration {
        LegCalibration {
            coxa: link(45.0, coxa_zero_deg, -180.0, 180.0),
            femur: link(85.0, 125.0, -360.0, 360.0),
            tibia: link(141.0, 40.0, -360.0, 360.0),
        }
    }

    #[test]
    fn test_standing_pose() {
        // Middle leg under the body at the lowest walking height
        let angles = solve(&Point3::new(125.0, -85.0, 0.0), &unlimited_leg(0.0)).unwrap();

        assert!(angles.coxa_deg.abs() < 1e-9);
        assert!((angles.femur_deg - 84.5).abs() < 0.1, "femur {}", angles.femur_deg);
        assert!((angles.tibia_deg - 15.8).abs() < 0.1, "tibia {}", angles.tibia_deg);
    }

    #[test]
    fn test_coxa_zero_rotation() {
        // A front leg's neutral direction maps to a zero coxa angle
        let target = Point3::from_polar(125.0, 45.0, -85.0);
        let angles = solve(&target, &unlimited_leg(45.0)).unwrap();
        assert!(angles.coxa_deg.abs() < 1e-9);

        // Moving the foot forwards turns the coxa towards +z
        let target = Point3::from_polar(125.0, 35.0, -85.0);
        let angles = solve(&target, &unlimited_leg(45.0)).unwrap();
        assert!((angles.coxa_deg - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_reachability_boundary() {
        let calib = unlimited_leg(0.0);
        let reach = calib.reach_mm();
        let origin = calib.coxa.length_mm;

        // Just inside and exactly on the boundary the leg can still be solved
        assert!(solve(&Point3::new(origin + reach - 0.01, 0.0, 0.0), &calib).is_ok());
        assert!(solve(&Point3::new(origin + reach, 0.0, 0.0), &calib).is_ok());

        // Just outside it cannot
        match solve(&Point3::new(origin + reach + 0.01, 0.0, 0.0), &calib) {
            Err(IkError::Unreachable { distance_mm, reach_mm }) => {
                assert!(distance_mm > reach_mm);
                assert_eq!(reach_mm, 226.0);
            },
            r => panic!("Expected an unreachable error, got {:?}", r)
        }

        // The boundary also holds off-axis
        let dir = Point3::new(3.0, -4.0, 0.0);
        let scale = |d: f64| Point3::new(origin + dir.x * d / 5.0, dir.y * d / 5.0, 0.0);
        assert!(solve(&scale(reach - 0.01), &calib).is_ok());
        assert!(matches!(
            solve(&scale(reach + 0.01), &calib),
            Err(IkError::Unreachable { .. })
        ));
    }

    #[test]
    fn test_angle_limit_boundary() {
        let coxa = link(45.0, 0.0, 10.0, 100.0);

        assert!(check_angle(Joint::Coxa, 100.0, &coxa).is_ok());
        assert!(check_angle(Joint::Coxa, 10.0, &coxa).is_ok());
        assert!(matches!(
            check_angle(Joint::Coxa, 100.001, &coxa),
            Err(IkError::OutOfRange { joint: Joint::Coxa, .. })
        ));
        assert!(check_angle(Joint::Coxa, 9.999, &coxa).is_err());
        assert!(check_angle(Joint::Coxa, std::f64::NAN, &coxa).is_err());

        // Through the solver, the coxa angle equals the direction of the target
        let mut calib = unlimited_leg(0.0);
        calib.coxa = coxa;
        let towards = |deg: f64| {
            let rad = deg.to_radians();
            Point3::new(100.0 * rad.cos(), -100.0, 100.0 * rad.sin())
        };

        assert!(solve(&towards(99.999), &calib).is_ok());
        match solve(&towards(100.001), &calib) {
            Err(IkError::OutOfRange { joint, angle_deg, .. }) => {
                assert_eq!(joint, Joint::Coxa);
                assert!((angle_deg - 100.001).abs() < 1e-6);
            },
            r => panic!("Expected an out of range error, got {:?}", r)
        }
    }

    #[test]
    fn test_calibration_validation() {
        assert!(unlimited_leg(0.0).validate().is_ok());

        let mut calib = unlimited_leg(0.0);
        calib.femur.length_mm = 0.0;
        assert_eq!(
            calib.validate(),
            Err(CalibrationError::NonPositiveLength(Joint::Femur, 0.0))
        );

        let mut calib = unlimited_leg(0.0);
        calib.tibia.min_angle_deg = 50.0;
        calib.tibia.max_angle_deg = 40.0;
        assert_eq!(
            calib.validate(),
            Err(CalibrationError::InvertedLimits(Joint::Tibia, 50.0, 40.0))
        );
    }
}
