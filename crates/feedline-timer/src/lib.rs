//! Warning/expiration timer pair for Feedline sessions.
//!
//! One session has one [`TimerPair`]: a warning deadline, an expiration
//! deadline strictly after it, and the one-second countdown that runs
//! between the two. The pair yields [`TimerEvent`]s in order and never
//! yields anything after [`TimerEvent::Expired`].
//!
//! # Countdown derivation
//!
//! The countdown is not a second, free-running interval. Every countdown
//! tick is scheduled relative to the expiration deadline (`expires_at - n`
//! seconds), so the countdown reaches zero at exactly the instant the
//! session expires and the two can never disagree.
//!
//! # Integration
//!
//! [`SessionTimers`] holds at most one pair and is designed to sit inside
//! the lifecycle actor's `tokio::select!` loop. With no pair armed,
//! [`SessionTimers::wait`] pends forever:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         biased;
//!         (generation, event) = timers.wait() => { /* handle timer event */ }
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!     }
//! }
//! ```
//!
//! Time comes from `tokio::time`, so tests drive it with
//! `#[tokio::test(start_paused = true)]`.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Errors produced when timings are misconfigured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    /// The warning would fire at or after expiration.
    #[error(
        "warning deadline ({warning_after:?}) must be strictly earlier than expiration deadline ({expire_after:?})"
    )]
    WarningNotBeforeExpiration {
        warning_after: Duration,
        expire_after: Duration,
    },

    /// A zero warning deadline would open the warning the instant the
    /// session starts.
    #[error("warning deadline must be greater than zero")]
    ZeroWarning,

    /// The expiration is further out than [`MAX_EXPIRE_AFTER`].
    #[error("expiration deadline ({expire_after:?}) exceeds the maximum of {max:?}")]
    ExpirationTooLong {
        expire_after: Duration,
        max: Duration,
    },
}

/// Longest session cycle accepted: one week. Anything longer could
/// overflow when added to an `Instant`.
pub const MAX_EXPIRE_AFTER: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Deadlines of one session cycle, both measured from the moment the pair
/// is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// When the warning opens.
    pub warning_after: Duration,
    /// When the session expires. Must be strictly greater than
    /// `warning_after`.
    pub expire_after: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl TimerConfig {
    /// Production timings: warn after 10 minutes, expire after 15.
    pub const fn production() -> Self {
        Self {
            warning_after: Duration::from_secs(10 * 60),
            expire_after: Duration::from_secs(15 * 60),
        }
    }

    /// Debug timings: warn after 20 seconds, expire after 30.
    pub const fn debug() -> Self {
        Self {
            warning_after: Duration::from_secs(20),
            expire_after: Duration::from_secs(30),
        }
    }

    /// Creates a validated config.
    pub fn new(warning_after: Duration, expire_after: Duration) -> Result<Self, TimerError> {
        let config = Self {
            warning_after,
            expire_after,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a validated config from whole seconds.
    pub fn from_secs(warning_after: u64, expire_after: u64) -> Result<Self, TimerError> {
        Self::new(
            Duration::from_secs(warning_after),
            Duration::from_secs(expire_after),
        )
    }

    /// Checks `0 < warning_after < expire_after <= MAX_EXPIRE_AFTER`.
    pub fn validate(&self) -> Result<(), TimerError> {
        if self.warning_after.is_zero() {
            return Err(TimerError::ZeroWarning);
        }
        if self.expire_after > MAX_EXPIRE_AFTER {
            return Err(TimerError::ExpirationTooLong {
                expire_after: self.expire_after,
                max: MAX_EXPIRE_AFTER,
            });
        }
        if self.warning_after >= self.expire_after {
            return Err(TimerError::WarningNotBeforeExpiration {
                warning_after: self.warning_after,
                expire_after: self.expire_after,
            });
        }
        Ok(())
    }

    /// Length of the warning window, i.e. how long the user has to extend.
    pub fn warning_window(&self) -> Duration {
        self.expire_after.saturating_sub(self.warning_after)
    }
}

/// Whole seconds left until `deadline`, rounded up so a partial second
/// still shows as one.
pub fn seconds_until(now: Instant, deadline: Instant) -> u64 {
    ceil_secs(deadline.saturating_duration_since(now))
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What a [`TimerPair`] reports when one of its deadlines passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The warning deadline passed. `seconds_remaining` is the length of
    /// the warning window, rounded up.
    Warning { seconds_remaining: u64 },
    /// One second of the countdown elapsed. Always at least 1; the zero
    /// tick is [`TimerEvent::Expired`].
    Countdown { seconds_remaining: u64 },
    /// The expiration deadline passed. Fired exactly once per pair.
    Expired,
}

// ---------------------------------------------------------------------------
// TimerPair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Warning,
    Countdown(u64),
    Expired,
    Done,
}

/// The warning and expiration deadlines of one session cycle.
///
/// Dropping the pair cancels both timers; nothing is left scheduled.
#[derive(Debug)]
pub struct TimerPair {
    generation: u64,
    armed_at: Instant,
    warning_at: Instant,
    expires_at: Instant,
    phase: Phase,
}

impl TimerPair {
    /// Arms a new pair starting now.
    ///
    /// A config whose warning is not before its expiration skips the
    /// warning phase entirely; expiration still fires, once. Deadlines past
    /// [`MAX_EXPIRE_AFTER`] are clamped to it.
    pub fn arm(config: TimerConfig, generation: u64) -> Self {
        let armed_at = Instant::now();
        let warning_at = armed_at + config.warning_after.min(MAX_EXPIRE_AFTER);
        let expires_at = armed_at + config.expire_after.min(MAX_EXPIRE_AFTER);
        let phase = if warning_at < expires_at {
            Phase::Warning
        } else {
            Phase::Expired
        };

        debug!(
            generation,
            warning_after_secs = config.warning_after.as_secs_f64(),
            expire_after_secs = config.expire_after.as_secs_f64(),
            "timer pair armed"
        );

        Self {
            generation,
            armed_at,
            warning_at,
            expires_at,
            phase,
        }
    }

    /// The generation this pair was armed for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn armed_at(&self) -> Instant {
        self.armed_at
    }

    pub fn warning_at(&self) -> Instant {
        self.warning_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// `true` once [`TimerEvent::Expired`] has been returned.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Waits for the next deadline and returns its event.
    ///
    /// After `Expired` this future pends forever. If the caller polls late
    /// (past the expiration deadline), any remaining warning or countdown
    /// ticks are skipped and `Expired` is returned directly.
    pub async fn next_event(&mut self) -> TimerEvent {
        let event = match self.phase {
            Phase::Warning => {
                time::sleep_until(self.warning_at).await;
                if Instant::now() >= self.expires_at {
                    self.expire()
                } else {
                    let remaining = ceil_secs(self.expires_at - self.warning_at);
                    self.phase = Self::after(remaining);
                    TimerEvent::Warning {
                        seconds_remaining: remaining,
                    }
                }
            }
            Phase::Countdown(n) => {
                let due = self
                    .expires_at
                    .checked_sub(Duration::from_secs(n))
                    .unwrap_or(self.warning_at);
                time::sleep_until(due).await;
                if Instant::now() >= self.expires_at {
                    self.expire()
                } else {
                    self.phase = Self::after(n);
                    TimerEvent::Countdown {
                        seconds_remaining: n,
                    }
                }
            }
            Phase::Expired => {
                time::sleep_until(self.expires_at).await;
                self.expire()
            }
            Phase::Done => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        trace!(generation = self.generation, ?event, "timer event");
        event
    }

    /// Seconds left until expiration, as the countdown would display them.
    pub fn seconds_remaining(&self) -> u64 {
        seconds_until(Instant::now(), self.expires_at)
    }

    /// Phase following a tick that displayed `shown` seconds.
    fn after(shown: u64) -> Phase {
        if shown > 1 {
            Phase::Countdown(shown - 1)
        } else {
            Phase::Expired
        }
    }

    fn expire(&mut self) -> TimerEvent {
        self.phase = Phase::Done;
        TimerEvent::Expired
    }
}

// ---------------------------------------------------------------------------
// SessionTimers
// ---------------------------------------------------------------------------

/// Holds the single live [`TimerPair`], if any.
///
/// Arming always drops the previous pair in the same step, so there is
/// never a window in which two pairs can both fire.
#[derive(Debug, Default)]
pub struct SessionTimers {
    pair: Option<TimerPair>,
}

impl SessionTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any existing pair and arms a new one.
    pub fn arm(&mut self, config: TimerConfig, generation: u64) {
        if let Some(old) = self.pair.take() {
            debug!(generation = old.generation, "timer pair replaced");
        }
        self.pair = Some(TimerPair::arm(config, generation));
    }

    /// Cancels the current pair. Returns `false` if nothing was armed.
    pub fn cancel(&mut self) -> bool {
        match self.pair.take() {
            Some(old) => {
                debug!(generation = old.generation, "timer pair cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pair.is_some()
    }

    /// The live pair, if any.
    pub fn pair(&self) -> Option<&TimerPair> {
        self.pair.as_ref()
    }

    /// Waits for the next event of the live pair, tagged with the pair's
    /// generation.
    ///
    /// Pends forever while nothing is armed. The pair is dropped after it
    /// reports `Expired`.
    pub async fn wait(&mut self) -> (u64, TimerEvent) {
        let Some(pair) = self.pair.as_mut() else {
            std::future::pending::<()>().await;
            unreachable!()
        };
        let event = pair.next_event().await;
        let generation = pair.generation;
        if event == TimerEvent::Expired {
            self.pair = None;
        }
        (generation, event)
    }
}
