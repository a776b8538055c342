//! Host platform utility functions

use std::path::PathBuf;

/// Environment variable pointing at the root of the motion software tree.
const SW_ROOT_ENV_VAR: &str = "MOTION_SW_ROOT";

/// Get the root directory of the motion software.
///
/// If the `MOTION_SW_ROOT` environment variable is set its value is used,
/// otherwise the current working directory is assumed to be the root.
pub fn get_sw_root() -> PathBuf {
    match std::env::var(SW_ROOT_ENV_VAR) {
        Ok(s) => s.into(),
        Err(_) => PathBuf::from(".")
    }
}
