//! Lifecycle configuration and state machine.

use std::fmt;
use std::time::Duration;

use feedline_timer::TimerConfig;

// ---------------------------------------------------------------------------
// LifecycleConfig
// ---------------------------------------------------------------------------

/// Configuration for the lifecycle actor.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Warning and expiration deadlines used by the next `start()`.
    pub timings: TimerConfig,

    /// Upper bound on the refresh and remote logout round trips. A refresh
    /// that takes longer counts as failed.
    pub request_timeout: Duration,

    /// Capacity of the command channel.
    pub channel_size: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            timings: TimerConfig::production(),
            request_timeout: Duration::from_secs(10),
            channel_size: 32,
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

/// The lifecycle state of the current session.
///
/// ```text
///            start()                 warning deadline
///   Idle ─────────────▶ Active ────────────────────────▶ Warning
///    ▲                   ▲  ▲                              │  │
///    │                   │  └──────── start() ─────────────┘  │ extend()
///    │                   │                                    ▼
///    │                   └──────── refresh ok ─────────── Extending
///    │                                                        │
///    └──── expiration / force_logout / refresh failure ◀──────┘
/// ```
///
/// - **Idle**: no session, no timers.
/// - **Active**: timers running, warning not shown yet.
/// - **Warning**: warning open, countdown running. The expiration deadline
///   is still armed in parallel.
/// - **Extending**: the user chose to extend and a refresh is in flight.
///   The warning is closed and no timers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Active,
    Warning {
        seconds_remaining: u64,
    },
    Extending,
}

impl LifecycleState {
    /// Returns `true` when there is nothing to tear down.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns `true` while the warning should be on screen.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }

    /// The countdown value, only meaningful in `Warning`.
    pub fn seconds_remaining(&self) -> Option<u64> {
        match self {
            Self::Warning { seconds_remaining } => Some(*seconds_remaining),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active => write!(f, "Active"),
            Self::Warning { seconds_remaining } => write!(f, "Warning({seconds_remaining}s)"),
            Self::Extending => write!(f, "Extending"),
        }
    }
}
