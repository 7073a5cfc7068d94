//! Error types for the protocol layer.
//!
//! Each crate in Portcullis defines its own error enum. A
//! `ProtocolError` always means a serialization problem, never a
//! membership or session problem.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, a JSON value of the wrong shape
    /// (an array where an object was expected), or truncated input.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
