//! # Communications interface crate.
//!
//! Provides the command interfaces shared between the hexapod executable and the tools that drive
//! it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;
