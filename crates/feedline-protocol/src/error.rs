//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding auth endpoint bodies.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: an HTML error page instead of JSON, missing required
    /// fields, or a truncated body.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The body decoded but makes no sense, e.g. a successful login that
    /// doesn't name a user.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
