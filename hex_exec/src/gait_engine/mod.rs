//! # Gait engine module
//!
//! Plays gaits iteration by iteration through the limbs driver.
//!
//! A gait is split into three stages: `Prepare` moves the legs from the
//! neutral stance into the gait, `Main` is the part that may loop and
//! `Finalize` brings the legs back to the neutral stance. A newly requested
//! gait only takes over once the current one reaches the end of its main
//! stage, so that the legs are always handed over in the neutral stance.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod sequence;
mod state;
mod tables;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use sequence::*;
pub use state::*;
pub use tables::*;

use crate::limbs_driver::LimbsDriverError;
use comms_if::tc::GaitId;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of iterations in a gait.
pub const MAX_ITERATIONS: usize = 15;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during GaitEngine operation.
#[derive(Debug, thiserror::Error)]
pub enum GaitEngineError {
    #[error("The gait engine has not been initialised")]
    NotInitialised,

    #[error("The body height can only be changed while idle (engine is {0:?})")]
    NotIdle(EngineState),

    #[error("Body height {height_mm} mm is outside [{low_mm}, {high_mm}] mm")]
    HeightOutOfEnvelope { height_mm: f64, low_mm: f64, high_mm: f64 },

    #[error("Gait {gait} cannot be selected in the {posture:?} posture")]
    NotAvailable { gait: GaitId, posture: Posture },

    #[error("No definition for gait {0}")]
    UnknownGait(GaitId),

    #[error("Invalid definition for gait {0}: {1}")]
    InvalidTable(GaitId, SequenceError),

    #[error("Invalid gait engine parameters: {0}")]
    InvalidParams(&'static str),

    #[error("Limbs driver error: {0}")]
    LimbsDriverError(#[from] LimbsDriverError),
}
