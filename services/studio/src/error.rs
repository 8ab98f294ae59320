//! services/studio/src/error.rs
//!
//! Defines the primary error type for the entire studio service.

use crate::config::ConfigError;

/// The primary error type for the `studio` service's assembly path. Gateway
/// and storage failures never surface through this type: the interaction
/// controller folds them into the session state instead of propagating them.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying HTTP client while it is built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., preparing the storage directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
