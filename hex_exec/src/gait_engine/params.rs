//! Parameters structure for GaitEngine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use super::GaitEngineError;
use crate::geometry::LIMB_LIFT_HEIGHT_MM;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the gait engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Lowest body height, also used while the body rests on the ground.
    ///
    /// Units: millimeters
    pub height_low_mm: f64,

    /// Highest body height.
    ///
    /// Units: millimeters
    pub height_high_mm: f64,

    /// Height change of `increase_height` and `decrease_height`.
    ///
    /// Units: millimeters
    pub height_step_mm: f64,
}

impl Params {
    pub(crate) fn validate(&self) -> Result<(), GaitEngineError> {
        if !(self.height_low_mm.is_finite() && self.height_high_mm.is_finite()) {
            return Err(GaitEngineError::InvalidParams("height limits must be finite"));
        }
        if self.height_low_mm > self.height_high_mm {
            return Err(GaitEngineError::InvalidParams("low height is above high height"));
        }
        if self.height_low_mm <= LIMB_LIFT_HEIGHT_MM {
            return Err(GaitEngineError::InvalidParams(
                "low height must leave room to lift the feet"
            ));
        }
        if !(self.height_step_mm > 0.0) {
            return Err(GaitEngineError::InvalidParams("height step must be positive"));
        }
        Ok(())
    }
}
