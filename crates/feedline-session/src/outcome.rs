//! Classification of an authorization round trip.
//!
//! Every reauthorization ends in exactly one of four outcomes, and the
//! session authority applies exactly one transition per outcome. Keeping
//! the classification a plain function (instead of spreading it over the
//! call site) makes the "which failures mean no session" table testable on
//! its own.

use feedline_protocol::UserProfile;

use crate::SessionError;

/// What a reauthorization round trip told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The server confirmed the session and named the user.
    Authenticated(UserProfile),
    /// The server answered, and there is no session.
    Unauthenticated,
    /// The server explicitly rejected the cookie.
    AuthFailure,
    /// No usable answer: network error, timeout, server error, bad body.
    TransportFailure,
}

impl AuthOutcome {
    /// Sorts a collaborator result into one of the four outcomes.
    pub fn classify(result: Result<Option<UserProfile>, SessionError>) -> Self {
        match result {
            Ok(Some(user)) => Self::Authenticated(user),
            Ok(None) => Self::Unauthenticated,
            Err(e) if e.is_authorization_failure() => Self::AuthFailure,
            Err(_) => Self::TransportFailure,
        }
    }

    /// The identity, if any. Every outcome but `Authenticated` means "no
    /// session".
    pub fn into_identity(self) -> Option<UserProfile> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unauthenticated | Self::AuthFailure | Self::TransportFailure => None,
        }
    }
}
