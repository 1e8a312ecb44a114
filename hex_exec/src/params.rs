//! # Hexapod Executable Parameters
//!
//! This module provide parameters for the hexapod executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HexExecParams {

    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Cycle duration above which a synchronisation fault is raised.
    ///
    /// Units: seconds
    pub max_cycle_time_s: f64,

    /// Minimum level of the log messages, one of `INFO`, `DEBUG` or `TRACE`.
    pub log_level: String,

    /// Path to a raw configuration store image, relative to the software root.
    ///
    /// If given the leg calibration is read from this image rather than from
    /// `limbs_driver.toml`.
    #[serde(default)]
    pub config_store_image: Option<String>,
}

impl HexExecParams {
    /// Number of cycles per second
    pub fn cycle_frequency_hz(&self) -> f64 {
        1.0 / self.cycle_period_s
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
