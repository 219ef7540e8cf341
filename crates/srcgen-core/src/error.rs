//! Error types for srcgen plugins.

use thiserror::Error;

use crate::plugin::PluginKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no {kind} plugin registered for '{id}'")]
    PluginNotFound { kind: PluginKind, id: String },

    #[error("{kind} plugin '{name}' failed: {message}")]
    PluginFailed {
        kind: PluginKind,
        name: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
