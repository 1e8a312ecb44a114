//! Simulated servos

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::Serialize;

use super::Actuation;
use crate::geometry::{Joint, Leg, NUM_JOINTS, NUM_LEGS};
use util::maths::lin_map;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Angle range of a standard hobby servo, mapped onto `PULSE_RANGE_US`.
///
/// Units: degrees
const ANGLE_RANGE_DEG: (f64, f64) = (-90.0, 90.0);

/// Units: microseconds
const PULSE_RANGE_US: (f64, f64) = (500.0, 2500.0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Servos simulated on the host, commits complete instantly.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimServos {
    staged_deg: [[f64; NUM_JOINTS]; NUM_LEGS],
    committed_deg: [[f64; NUM_JOINTS]; NUM_LEGS],
    num_commits: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimServos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self, leg: Leg, joint: Joint) -> f64 {
        self.committed_deg[leg.index()][joint.index()]
    }

    pub fn num_commits(&self) -> u64 {
        self.num_commits
    }

    /// Pulse width a real servo would be driven with for the given angle.
    pub fn pulse_width_us(angle_deg: f64) -> f64 {
        lin_map(ANGLE_RANGE_DEG, PULSE_RANGE_US, angle_deg)
    }
}

impl Actuation for SimServos {
    fn set_joint_angle(&mut self, leg: Leg, joint: Joint, angle_deg: f64) {
        self.staged_deg[leg.index()][joint.index()] = angle_deg;
    }

    fn commit_angles(&mut self) {
        self.committed_deg = self.staged_deg;
        self.num_commits += 1;

        trace!(
            "Commit {}: {:?}",
            self.num_commits,
            self.committed_deg
                .iter()
                .map(|l| [
                    Self::pulse_width_us(l[0]).round(),
                    Self::pulse_width_us(l[1]).round(),
                    Self::pulse_width_us(l[2]).round(),
                ])
                .collect::<Vec<_>>()
        );
    }

    fn is_commit_complete(&self) -> bool {
        true
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
