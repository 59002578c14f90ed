//! Codec trait and implementations for the auth endpoint bodies.
//!
//! The session layer doesn't care how bodies are serialized. It asks a
//! [`Codec`] to turn credentials into bytes and bytes into envelopes, so a
//! test can swap the format without touching the collaborators.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes request bodies and decodes response bodies.
///
/// `Send + Sync + 'static` because the codec lives inside the HTTP-backed
/// auth collaborator, which is shared by the lifecycle actor, the guard and
/// startup code across tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`), which is what the backend
/// speaks.
///
/// ## Example
///
/// ```rust
/// use feedline_protocol::{Codec, JsonCodec, LoginCredentials};
///
/// let codec = JsonCodec;
/// let creds = LoginCredentials::new("ana", "Secret123");
///
/// let bytes = codec.encode(&creds).unwrap();
/// let decoded: LoginCredentials = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, creds);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        // Refresh and logout may answer with an empty body. Treat it as an
        // empty JSON object so `Ack` still decodes.
        if data.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_slice(b"{}").map_err(ProtocolError::Decode);
        }
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
