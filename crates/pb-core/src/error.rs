//! # AppError
//!
//! Centralized error handling for the PinBoard session core.
//! Every failure here is recoverable: the caller shows a notice and carries on.

use thiserror::Error;

/// The primary error type for all pb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or unusable publish fields (e.g., no image source)
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (e.g., unknown pin id)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Writing a document to the remote collection failed
    #[error("remote write failed: {0}")]
    RemoteWrite(String),

    /// The remote subscription reported a failure
    #[error("remote read failed: {0}")]
    RemoteRead(String),

    /// The generative metadata service failed or returned garbage
    #[error("generative service error: {0}")]
    GenerativeService(String),

    /// Sign-in was rejected or the identity provider is unavailable
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Local persistence failure (e.g., unwritable blob file)
    #[error("storage error: {0}")]
    Storage(String),

    /// Anything else (e.g., template rendering)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound(entity.to_string(), id.into())
    }
}

/// A specialized Result type for PinBoard logic.
pub type Result<T> = std::result::Result<T, AppError>;
