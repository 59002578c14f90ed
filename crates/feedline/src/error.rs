//! Unified error type for the Feedline client.

use feedline_gate::GateError;
use feedline_lifecycle::LifecycleError;
use feedline_protocol::ProtocolError;
use feedline_session::SessionError;
use feedline_timer::TimerError;
use feedline_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `feedline` facade, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum FeedlineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Login failures land here.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
