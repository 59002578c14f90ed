//! [`AuthApi`] backed by the real `/api/auth` endpoints.

use feedline_protocol::{
    Ack, AuthorizeResponse, Codec, JsonCodec, LoginCredentials, ProtocolError, UserProfile,
};
use feedline_transport::{HttpRequest, HttpTransport, TransportError};

use crate::{AuthApi, SessionError};

const LOGIN_PATH: &str = "/login";
const AUTHORIZE_PATH: &str = "/autorizar";
const REFRESH_PATH: &str = "/refrescar";
const LOGOUT_PATH: &str = "/logout";

/// The endpoints without a request payload still expect a JSON object.
const EMPTY_BODY: &[u8] = b"{}";

/// Calls the backend's auth endpoints over an [`HttpTransport`].
///
/// Every request is a credentialed `POST`, since the session is carried in
/// a cookie.
#[derive(Debug, Clone)]
pub struct HttpAuthApi<T, C = JsonCodec> {
    transport: T,
    codec: C,
    base_url: String,
}

impl<T: HttpTransport> HttpAuthApi<T> {
    /// Creates a client for the auth endpoints under `base_url`
    /// (e.g. `https://api.example.com/api/auth`), using JSON bodies.
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self::with_codec(transport, JsonCodec, base_url)
    }
}

impl<T: HttpTransport, C: Codec> HttpAuthApi<T, C> {
    /// Same as [`new`](HttpAuthApi::new) with a custom codec.
    pub fn with_codec(transport: T, codec: C, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            transport,
            codec,
            base_url,
        }
    }

    /// The full URL of an auth endpoint.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let request = HttpRequest::post(self.endpoint(path), body);
        let response = self.transport.send(request).await?;
        Ok(response.body)
    }

    /// The server's message from an error body, if it sent one.
    fn server_message(&self, body: &[u8]) -> Option<String> {
        self.codec
            .decode::<Ack>(body)
            .ok()
            .and_then(|ack| ack.message)
    }
}

impl<T: HttpTransport, C: Codec> AuthApi for HttpAuthApi<T, C> {
    async fn login(&self, credentials: &LoginCredentials) -> Result<UserProfile, SessionError> {
        let body = self.codec.encode(credentials)?;
        let bytes = match self.post(LOGIN_PATH, body).await {
            Ok(bytes) => bytes,
            Err(TransportError::Status { status, body }) if status.is_authorization_failure() => {
                let message = self
                    .server_message(&body)
                    .unwrap_or_else(|| "invalid credentials".to_string());
                return Err(SessionError::AuthFailed(message));
            }
            Err(e) => return Err(e.into()),
        };

        let envelope: AuthorizeResponse = self.codec.decode(&bytes)?;
        let message = envelope.message.clone();
        match envelope.into_identity() {
            Some(user) => {
                tracing::info!(user_id = %user.id, "login succeeded");
                Ok(user)
            }
            None if message.is_empty() => Err(ProtocolError::InvalidResponse(
                "login response did not include a user".into(),
            )
            .into()),
            None => Err(SessionError::AuthFailed(message)),
        }
    }

    async fn refresh(&self) -> Result<(), SessionError> {
        match self.post(REFRESH_PATH, EMPTY_BODY.to_vec()).await {
            Ok(bytes) => {
                let ack: Ack = self.codec.decode(&bytes)?;
                tracing::debug!(message = ?ack.message, "session refreshed");
                Ok(())
            }
            Err(TransportError::Status { status, .. }) if status.is_authorization_failure() => {
                Err(SessionError::Unauthorized)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn reauthorize(&self) -> Result<Option<UserProfile>, SessionError> {
        match self.post(AUTHORIZE_PATH, EMPTY_BODY.to_vec()).await {
            Ok(bytes) => {
                let envelope: AuthorizeResponse = self.codec.decode(&bytes)?;
                Ok(envelope.into_identity())
            }
            // "Not logged in" is an answer, not an error.
            Err(TransportError::Status { status, .. }) if status.is_authorization_failure() => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn logout(&self) -> Result<(), SessionError> {
        match self.post(LOGOUT_PATH, EMPTY_BODY.to_vec()).await {
            Ok(_) => Ok(()),
            Err(TransportError::Status { status, .. }) if status.is_authorization_failure() => {
                Err(SessionError::Unauthorized)
            }
            Err(e) => Err(e.into()),
        }
    }
}
