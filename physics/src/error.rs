//! Error type for the physics core.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A dynamic body was built without any collision shape. Fatal at construction.
    #[error("dynamic body `{0}` has no collision shapes")]
    EmptyBody(String),

    /// A mesh could not become a collider. Callers log and skip it.
    #[error("degenerate mesh `{name}`: {reason}")]
    DegenerateMesh { name: String, reason: String },

    #[error("rigid body is not registered in the world")]
    MissingBody,

    #[error("failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("mesh loader worker has shut down")]
    LoaderClosed,

    #[error("invalid tuning parameter: {0}")]
    InvalidParam(String),
}

impl Error {
    #[inline]
    pub fn degenerate(name: &str, reason: impl Into<String>) -> Self {
        Self::DegenerateMesh {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
