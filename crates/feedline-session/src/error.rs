//! Error types for the session layer.

use feedline_protocol::ProtocolError;
use feedline_transport::TransportError;

/// Errors the authentication collaborators can report.
///
/// Most of these never reach the user: the session authority folds every
/// failure of a reauthorization into "no session", and the lifecycle
/// manager folds refresh failures into a forced logout. They exist so the
/// collaborators can say *why*, for logging and for the login form.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The login endpoint rejected the credentials. Carries the server's
    /// message so the login form can show it.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The server no longer accepts the session cookie (HTTP 401 on an
    /// endpoint other than login).
    #[error("session is no longer authorized")]
    Unauthorized,

    /// The request never got a usable answer, or the server failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a body we couldn't make sense of.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl SessionError {
    /// `true` if the server explicitly rejected the credentials or cookie.
    pub fn is_authorization_failure(&self) -> bool {
        match self {
            Self::AuthFailed(_) | Self::Unauthorized => true,
            Self::Transport(e) => e
                .status()
                .is_some_and(|s| s.is_authorization_failure()),
            Self::Protocol(_) => false,
        }
    }
}
