//! Error types for the lifecycle layer.

use feedline_timer::TimerError;

/// Errors that can occur during lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// `start()` was called without a live session record.
    #[error("cannot start session timers: no session is live")]
    NoSession,

    /// The requested timings are unusable.
    #[error("invalid session timings: {0}")]
    InvalidTimings(#[from] TimerError),

    /// The lifecycle actor has stopped.
    #[error("session lifecycle manager is unavailable")]
    Unavailable,
}
