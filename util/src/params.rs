//! Generic parameters functions
//!
//! Each module stores its tuning parameters in a TOML file which is
//! deserialised into the module's `Params` struct at initialisation time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read the parameter file: {0}")]
    FileLoadError(#[from] std::io::Error),

    #[error("Cannot deserialise the parameter file: {0}")]
    DeserialiseError(#[from] toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    // Load the file into a string
    let params_str = read_to_string(param_file_path)?;

    // Parse the string into the parameter struct
    Ok(toml::from_str(params_str.as_str())?)
}
