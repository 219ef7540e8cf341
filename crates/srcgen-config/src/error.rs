//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    Parse(#[from] kdl::KdlError),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("duplicate definition: {0}")]
    Duplicate(String),

    #[error("cycle detected in variables: {0}")]
    CycleDetected(String),

    #[error("unsupported encoding '{encoding}' for {location}")]
    UnsupportedEncoding { location: String, encoding: String },

    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Plugin(#[from] srcgen_core::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
