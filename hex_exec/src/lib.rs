//! # Hexapod library.
//!
//! The motion core of the hexapod, and the items shared between the executable
//! and the benchmarks.
//!
//! From the bottom up: `kinematics` converts a foot position into joint
//! angles, `path` interpolates foot positions between two points,
//! `limbs_driver` moves all six feet along their paths step by step and
//! `gait_engine` plays gaits iteration by iteration through the limbs driver.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - global data of the executable
pub mod data_store;

/// Fault register - classified faults latched per module
pub mod faults;

/// Gait engine module - sequences gaits and rescales them to the body height
pub mod gait_engine;

/// Geometry - points, legs and joints
pub mod geometry;

/// Inverse kinematics of a single leg
pub mod kinematics;

/// Limbs driver module - moves the six feet along their paths
pub mod limbs_driver;

/// Executable parameters
pub mod params;

/// Foot path interpolation
pub mod path;

/// Servo controller - sends joint angles to the servos
pub mod servo_ctrl;
