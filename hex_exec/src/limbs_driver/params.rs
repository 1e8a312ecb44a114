//! Parameters structure for LimbsDriver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use crate::{
    geometry::{Point3, NUM_LEGS},
    kinematics::LegCalibration,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the limbs driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Time given to the servos to reach each interpolation step.
    ///
    /// Units: milliseconds
    pub step_delay_ms: u64,

    /// Per-leg parameters, in `Leg::ALL` order.
    pub legs: [LegParams; NUM_LEGS],
}

/// Parameters of a single leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LegParams {
    pub calibration: LegCalibration,

    /// Position of the foot at power on, in the leg frame.
    ///
    /// Units: millimeters
    pub start_position_mm: Point3,
}
