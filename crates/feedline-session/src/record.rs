//! The session record: who is logged in, and since when.

use feedline_protocol::UserProfile;
use tokio::time::Instant;

/// The currently authenticated identity.
///
/// Absence of a session is modelled as `Option<SessionRecord>::None` in the
/// [`SessionAuthority`](crate::SessionAuthority), so a `SessionRecord`
/// always names someone.
///
/// `valid_since` uses Tokio's `Instant` rather than the std one so that
/// tests running under `tokio::time::pause()` see consistent values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// The user the backend authorized.
    pub identity: UserProfile,

    /// When the backend last confirmed this session: login, refresh, or a
    /// successful reauthorization.
    pub valid_since: Instant,
}

impl SessionRecord {
    /// A record for `identity`, validated now.
    pub fn new(identity: UserProfile) -> Self {
        Self {
            identity,
            valid_since: Instant::now(),
        }
    }
}
