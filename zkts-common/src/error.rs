//! Error types shared by the zkts crates.

use thiserror::Error;

/// Errors produced while parsing or decoding shared zkts types.
#[derive(Debug, Error)]
pub enum CommonError {
    /// Input was not valid hexadecimal.
    #[error("invalid hex for {label}: {reason}")]
    InvalidHex {
        /// What was being parsed.
        label: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// Input decoded to the wrong number of bytes.
    #[error("invalid length for {label}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// What was being parsed.
        label: &'static str,
        /// Required byte length.
        expected: usize,
        /// Byte length actually decoded.
        actual: usize,
    },

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
