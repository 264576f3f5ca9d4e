//! Domain error types
//!
//! This module defines the error hierarchy for Cloak. All errors are
//! domain-specific and don't expose third-party types. Error messages never
//! contain document text or detected values — only categories, positions,
//! and counts.

use thiserror::Error;

/// Main Cloak error type
///
/// This is the primary error type used throughout the engine.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum CloakError {
    /// Input rejected before any detection ran
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// A single recognizer failed; the batch continues without it
    #[error("Recognizer '{recognizer}' failed: {reason}")]
    Recognizer { recognizer: String, reason: String },

    /// Token-classification service errors
    #[error("ML inference error: {0}")]
    Ml(#[from] MlError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A pipeline pass failed in a way that cannot be isolated
    #[error("Pipeline error in pass '{pass}': {reason}")]
    Pipeline { pass: String, reason: String },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Audit trail errors
    #[error("Audit error: {0}")]
    Audit(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Input rejection reasons
///
/// Malformed input is rejected with a typed reason before any recognizer or
/// ML call runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// Text is empty or whitespace-only
    #[error("Document text is empty")]
    Empty,

    /// Text exceeds the configured size ceiling
    #[error("Document text exceeds maximum length: {length} > {max}")]
    TooLong { length: usize, max: usize },

    /// Text contains invalid character data
    #[error("Document text contains malformed encoding at byte {position}")]
    MalformedEncoding { position: usize },

    /// Requested language is not supported
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Token-classification service errors
///
/// The ML boundary is the only suspension point in the pipeline. Transient
/// failures are retried with backoff; exhausted retries degrade the document
/// to rule-only detection.
#[derive(Debug, Error)]
pub enum MlError {
    /// Failed to reach the inference endpoint
    #[error("Failed to connect to inference service: {0}")]
    ConnectionFailed(String),

    /// Service returned a malformed response
    #[error("Invalid response from inference service: {0}")]
    InvalidResponse(String),

    /// Service rejected the request
    #[error("Inference request rejected: {status} - {message}")]
    RequestRejected { status: u16, message: String },

    /// Request timed out
    #[error("Inference request timeout: {0}")]
    Timeout(String),

    /// All retry attempts exhausted
    #[error("Inference failed after {attempts} attempts: {reason}")]
    RetriesExhausted { attempts: u32, reason: String },
}

impl MlError {
    /// Whether a retry could succeed for this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MlError::ConnectionFailed(_)
                | MlError::Timeout(_)
                | MlError::RequestRejected { status: 429, .. }
                | MlError::RequestRejected { status: 500..=599, .. }
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for CloakError {
    fn from(err: std::io::Error) -> Self {
        CloakError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CloakError {
    fn from(err: serde_json::Error) -> Self {
        CloakError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CloakError {
    fn from(err: toml::de::Error) -> Self {
        CloakError::Configuration(format!("TOML parse error: {err}"))
    }
}
