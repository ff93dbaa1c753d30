//! Error types for the hangboard_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for hangboard_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Catalog lookup failed; the message is surfaced to the user unchanged
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// A filter key that could not be resolved against the catalog.
///
/// Each variant carries the key that failed plus every key resolved before it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Protocol '{protocol}' not found.")]
    ProtocolNotFound { protocol: String },

    #[error("Intensity level '{intensity}' not found for protocol '{protocol}'.")]
    IntensityNotFound { protocol: String, intensity: String },

    #[error(
        "Duration '{duration}' minutes not found for protocol '{protocol}' at intensity level '{intensity}'."
    )]
    DurationNotFound {
        protocol: String,
        intensity: String,
        duration: u32,
    },
}
