//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software
/// tree, i.e. the directory containing `params/` and `sessions/`.
pub const SW_ROOT_ENV_VAR: &str = "HEXAPOD_SW_ROOT";

/// Get the root of the software tree from the environment.
pub fn get_hexapod_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
