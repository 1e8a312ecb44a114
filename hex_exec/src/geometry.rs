//! # Body geometry
//!
//! Points, leg and joint identifiers shared by the motion modules.
//!
//! Every leg works in its own frame centred on the coxa joint: `y` is up, `z`
//! points forwards along the body and `x` points away from the body. A leg's
//! neutral direction is described by a polar angle measured from `+z`, so that
//! a point at `radius` and `angle` is `(radius sin(angle), y, radius cos(angle))`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use std::fmt;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of legs on the hexapod.
pub const NUM_LEGS: usize = 6;

/// Number of joints in each leg.
pub const NUM_JOINTS: usize = 3;

/// Clearance between a lifted foot and the ground.
///
/// Units: millimeters
pub const LIMB_LIFT_HEIGHT_MM: f64 = 30.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point in a leg frame.
///
/// Units: millimeters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Leg identifiers, in the order used by every per-leg array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    LeftFront,
    LeftMiddle,
    LeftRear,
    RightFront,
    RightMiddle,
    RightRear,
}

/// Joints of a leg, from the body outwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Joint {
    Coxa,
    Femur,
    Tibia,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a point from its horizontal polar coordinates and its height.
    pub fn from_polar(radius_mm: f64, angle_deg: f64, y: f64) -> Self {
        let angle_rad = angle_deg.to_radians();
        Self {
            x: radius_mm * angle_rad.sin(),
            y,
            z: radius_mm * angle_rad.cos(),
        }
    }

    /// Horizontal distance from the leg origin.
    pub fn radius(&self) -> f64 {
        self.x.hypot(self.z)
    }

    /// Horizontal polar angle, measured from `+z` towards `+x`.
    ///
    /// Units: radians
    pub fn polar_angle_rad(&self) -> f64 {
        self.x.atan2(self.z)
    }

    /// True if each coordinate is within `tol_mm` of the other point's.
    pub fn approx_eq(&self, other: &Point3, tol_mm: f64) -> bool {
        (self.x - other.x).abs() <= tol_mm
            && (self.y - other.y).abs() <= tol_mm
            && (self.z - other.z).abs() <= tol_mm
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(p: [f64; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

impl Leg {
    pub const ALL: [Leg; NUM_LEGS] = [
        Leg::LeftFront,
        Leg::LeftMiddle,
        Leg::LeftRear,
        Leg::RightFront,
        Leg::RightMiddle,
        Leg::RightRear,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_left(self) -> bool {
        matches!(self, Leg::LeftFront | Leg::LeftMiddle | Leg::LeftRear)
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Joint {
    pub const ALL: [Joint; NUM_JOINTS] = [Joint::Coxa, Joint::Femur, Joint::Tibia];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
