//! # Servo Controller Module
//!
//! The interface through which joint angles leave the motion core. One
//! implementation exists per kind of servo bus, the motion core only sees the
//! [`Actuation`] trait.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`Actuation`] implementation simulating the servos on the host.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::geometry::{Joint, Leg};

pub use sim::SimServos;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for driving the leg servos.
///
/// Angles are staged with `set_joint_angle` and only applied, all together, by
/// `commit_angles`.
pub trait Actuation {
    /// Stage the angle of one joint.
    ///
    /// Units: degrees
    fn set_joint_angle(&mut self, leg: Leg, joint: Joint, angle_deg: f64);

    /// Apply every staged angle at once.
    fn commit_angles(&mut self);

    /// True once the last commit has been taken into account by the servos.
    fn is_commit_complete(&self) -> bool;
}
