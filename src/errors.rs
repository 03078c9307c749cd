//! Unified error types and result handling.

use thiserror::Error;

/// Top-level error for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration is missing or malformed. Fatal before any
    /// store access.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document-store driver error, including the startup ping.
    #[error("Store error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Failed to encode a repaired document fragment back into BSON.
    #[error("BSON encoding error: {0}")]
    BsonEncode(#[from] mongodb::bson::ser::Error),

    /// Artifact file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON artifact serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV artifact serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP transport error talking to the email provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The email provider answered but did not accept the message.
    #[error("Notification error: {0}")]
    Notify(String),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
