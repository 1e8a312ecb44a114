//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface.
//!
//! Telecommands are JSON objects with a `type` and an optional `payload`, for
//! example:
//!
//! ```json
//! {"type": "SELECT_GAIT", "payload": "DIRECT_MOVEMENT"}
//! {"type": "SET_HEIGHT", "payload": 100.0}
//! {"type": "MAKE_SAFE"}
//! ```

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod gait;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use serde_json::{self, Value};
use thiserror::Error;

// Internal
pub use gait::GaitId;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the hexapod by an operator or a
/// script.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tc {
    /// Keep-alive, has no effect on the motion core.
    Heartbeat,

    /// Halt all motion processing.
    MakeSafe,

    /// Resume motion processing after a `MakeSafe`.
    MakeUnsafe,

    /// Request a gait. The gait engine decides when (and if) it is played.
    SelectGait(GaitId),

    /// Set the body height directly.
    ///
    /// Units: millimeters
    SetHeight(f64),

    /// Raise the body by one height step.
    IncreaseHeight,

    /// Lower the body by one height step.
    DecreaseHeight,

    /// Clear all latched faults.
    ClearFaults,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC is not a recognised telecommand: {0}")]
    InvalidTc(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse the JSON string into a value first so that syntax errors can
        // be told apart from unknown commands
        let val: Value = match serde_json::from_str(json_str) {
            Ok(v) => v,
            Err(e) => return Err(TcParseError::InvalidJson(e))
        };

        serde_json::from_value(val).map_err(TcParseError::InvalidTc)
    }

    /// Serialise the TC into a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
