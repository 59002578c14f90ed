use crate::StatusCode;

/// Errors that can occur at the HTTP transport boundary.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server could not be reached (DNS, refused connection, offline).
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    ///
    /// The body is kept verbatim so call sites can still show the
    /// server's message after an interceptor has reacted to the status.
    #[error("server responded with {status}")]
    Status {
        status: StatusCode,
        body: Vec<u8>,
    },
}

impl TransportError {
    /// The HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unreachable(_) | Self::Timeout => None,
        }
    }

    /// `true` for failures where no response was received.
    ///
    /// These are always treated as "no session" by the core, never as a
    /// rejection of the caller's credentials.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout)
    }
}
