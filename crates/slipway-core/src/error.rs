//! Errors shared across slipway-core.
//!
//! Only configuration errors live here; `descriptor`, `scm`, and `release`
//! declare their own error enums next to the code that raises them.

use thiserror::Error;

/// Failure to assemble a [`Config`](crate::config::Config).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file was read but could not be deserialized.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// No config file found in any searched location.
    #[error("no configuration file found")]
    NotFound,
}

/// Shorthand for results that fail with [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;
