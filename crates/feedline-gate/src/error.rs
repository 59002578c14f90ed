//! Error types for the gate layer.

use crate::Route;

/// Errors raised while configuring routes and the guard.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The string is not an in-app path.
    #[error("invalid route {0:?}: routes are absolute paths like \"/home\"")]
    InvalidRoute(String),

    /// The landing route would send unauthenticated users into a loop.
    #[error("landing route {0} must not be a protected route")]
    LandingProtected(Route),

    /// A zero reauthorization timeout would reject every navigation.
    #[error("reauthorize timeout must be greater than zero")]
    ZeroTimeout,
}
