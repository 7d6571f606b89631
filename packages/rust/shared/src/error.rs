//! Error types for ExpertDesk.
//!
//! Library crates use [`ExpertDeskError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::Resource;

/// Top-level error type for all ExpertDesk operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpertDeskError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A named collection could not be fetched (transport, non-2xx, or bad body).
    #[error("failed to fetch {resource}: {message}")]
    Fetch { resource: Resource, message: String },

    /// A raw record lacks a join key or carries an unusable value.
    ///
    /// Aggregation logs and skips these; it never returns them.
    #[error("invalid {resource} record: {message}")]
    AggregationInputInvalid { resource: Resource, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad argument, unknown option, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ExpertDeskError>;

impl ExpertDeskError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch error for the given collection.
    pub fn fetch(resource: Resource, msg: impl Into<String>) -> Self {
        Self::Fetch {
            resource,
            message: msg.into(),
        }
    }

    /// Create an invalid-input error for a record of the given collection.
    pub fn invalid_input(resource: Resource, msg: impl Into<String>) -> Self {
        Self::AggregationInputInvalid {
            resource,
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The collection a fetch failure refers to, if this is one.
    pub fn failed_resource(&self) -> Option<Resource> {
        match self {
            Self::Fetch { resource, .. } => Some(*resource),
            _ => None,
        }
    }
}
