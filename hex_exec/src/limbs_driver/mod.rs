//! # Limbs driver module
//!
//! Moves the six feet along their paths. Each interpolation step goes through
//! `Calculating` (advance every active leg and solve its joint angles),
//! `Loading` (hand all angles to the servos and commit them) and `Waiting`
//! (let the servos settle for `step_delay_ms`) before the next step starts.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod config_store;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use config_store::*;
pub use params::*;
pub use state::*;

use crate::{geometry::Leg, kinematics::{CalibrationError, IkError}};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Interpolation step count used until `set_smooth_config` is called.
pub const DEFAULT_SMOOTH_POINT_COUNT: u32 = 10;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LimbsDriver operation.
#[derive(Debug, thiserror::Error)]
pub enum LimbsDriverError {
    #[error("Invalid calibration for the {0} leg: {1}")]
    InvalidCalibration(Leg, CalibrationError),

    #[error("The start position of the {0} leg cannot be reached: {1}")]
    UnreachableStart(Leg, IkError),

    #[error("The step delay must be at least 1 ms")]
    InvalidStepDelay,

    #[error("The limbs driver has not been initialised")]
    NotInitialised,
}

// ---------------------------------------------------------------------------
// TEST SUPPORT
// ---------------------------------------------------------------------------

/// Calibration of the hexapod's legs, every foot starting in the lowered pose.
#[cfg(test)]
pub(crate) fn test_params() -> Params {
    use crate::{
        geometry::{Point3, NUM_LEGS},
        kinematics::{LegCalibration, LinkCalibration},
    };

    /// Coxa zero rotation of each leg
    const COXA_ZERO_DEG: [f64; NUM_LEGS] = [45.0, 0.0, -45.0, 45.0, 0.0, -45.0];

    let mut params = Params {
        step_delay_ms: 10,
        legs: [LegParams::default(); NUM_LEGS],
    };

    for (i, leg) in params.legs.iter_mut().enumerate() {
        leg.calibration = LegCalibration {
            coxa: LinkCalibration {
                length_mm: 45.0,
                zero_rotate_deg: COXA_ZERO_DEG[i],
                min_angle_deg: -90.0,
                max_angle_deg: 90.0,
            },
            femur: LinkCalibration {
                length_mm: 85.0,
                zero_rotate_deg: 125.0,
                min_angle_deg: -60.0,
                max_angle_deg: 150.0,
            },
            tibia: LinkCalibration {
                length_mm: 141.0,
                zero_rotate_deg: 40.0,
                min_angle_deg: -70.0,
                max_angle_deg: 120.0,
            },
        };

        // Neutral direction of the leg, lowered onto the body
        leg.start_position_mm = Point3::from_polar(110.0, 90.0 - COXA_ZERO_DEG[i], -20.0);
    }

    params
}
