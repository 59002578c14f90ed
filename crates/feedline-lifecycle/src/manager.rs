//! Lifecycle actor: an isolated Tokio task that owns the session timers.
//!
//! Everything that can change the lifecycle (timer deadlines, user intents,
//! the request interceptor, refresh completions, the authority being
//! cleared behind our back) is funnelled into this one task and handled
//! one message at a time. Handlers re-check the current generation and
//! state before acting, so a message that was already in flight when the
//! world changed is discarded instead of trusted.

use std::sync::Arc;

use feedline_session::{AuthApi, SessionAuthority, SessionRecord};
use feedline_timer::{SessionTimers, TimerConfig, TimerEvent};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time;

use crate::{LifecycleConfig, LifecycleError, LifecycleState};

/// Commands sent to the lifecycle actor through its channel.
enum LifecycleCommand {
    Start {
        reply: oneshot::Sender<Result<(), LifecycleError>>,
    },
    Extend {
        reply: oneshot::Sender<bool>,
    },
    ForceLogout {
        reply: oneshot::Sender<bool>,
    },
    SetTimings {
        timings: TimerConfig,
        reply: oneshot::Sender<Result<(), LifecycleError>>,
    },
    GetInfo {
        reply: oneshot::Sender<LifecycleInfo>,
    },
    Shutdown,
}

/// Result of a refresh round trip, posted back by the refresh task.
#[derive(Debug)]
enum RefreshOutcome {
    Refreshed,
    Failed(String),
    TimedOut,
}

#[derive(Debug)]
struct RefreshDone {
    generation: u64,
    outcome: RefreshOutcome,
}

/// A snapshot of the lifecycle, taken inside the actor.
#[derive(Debug, Clone)]
pub struct LifecycleInfo {
    /// Current state.
    pub state: LifecycleState,
    /// Advanced on every start, extend and logout. Events tagged with an
    /// older generation are ignored.
    pub generation: u64,
    /// Timings the next `start()` will use.
    pub timings: TimerConfig,
    /// Whether a timer pair is currently armed.
    pub timers_armed: bool,
}

/// Handle to the running lifecycle actor.
///
/// Cheap to clone: an `mpsc::Sender` plus a `watch::Receiver`. It is not
/// generic over the auth collaborator, so the request interceptor and the
/// navigation guard can hold one without knowing how the backend is
/// reached.
#[derive(Debug, Clone)]
pub struct LifecycleHandle {
    sender: mpsc::Sender<LifecycleCommand>,
    state: watch::Receiver<LifecycleState>,
}

impl LifecycleHandle {
    /// Starts (or restarts from zero) the warning → expiration sequence.
    ///
    /// Fails with [`LifecycleError::NoSession`] if the authority holds no
    /// session, and with [`LifecycleError::InvalidTimings`] if the
    /// configured timings are unusable.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        let (reply, rx) = oneshot::channel();
        self.send(LifecycleCommand::Start { reply }).await?;
        rx.await.map_err(|_| LifecycleError::Unavailable)?
    }

    /// Extends the session. Only meaningful while the warning is open.
    ///
    /// Resolves once the refresh round trip has finished. Returns `true` if
    /// the session was renewed and a fresh cycle started; `false` if there
    /// was no warning to act on or the refresh failed (in which case the
    /// session has been terminated).
    pub async fn extend(&self) -> Result<bool, LifecycleError> {
        let (reply, rx) = oneshot::channel();
        self.send(LifecycleCommand::Extend { reply }).await?;
        rx.await.map_err(|_| LifecycleError::Unavailable)
    }

    /// Terminates the session locally and asks the backend to log out.
    ///
    /// Idempotent. Returns `true` only for the call that actually ended a
    /// session; repeated calls return `false` and have no side effects.
    pub async fn force_logout(&self) -> Result<bool, LifecycleError> {
        let (reply, rx) = oneshot::channel();
        self.send(LifecycleCommand::ForceLogout { reply }).await?;
        rx.await.map_err(|_| LifecycleError::Unavailable)
    }

    /// Replaces the timings used by the next `start()`. A running cycle
    /// keeps its deadlines.
    pub async fn set_timings(&self, timings: TimerConfig) -> Result<(), LifecycleError> {
        let (reply, rx) = oneshot::channel();
        self.send(LifecycleCommand::SetTimings { timings, reply })
            .await?;
        rx.await.map_err(|_| LifecycleError::Unavailable)?
    }

    /// Round-trips to the actor and returns its current view.
    ///
    /// Because the actor handles due timer deadlines before commands, the
    /// snapshot reflects every deadline that has already passed.
    pub async fn snapshot(&self) -> Result<LifecycleInfo, LifecycleError> {
        let (reply, rx) = oneshot::channel();
        self.send(LifecycleCommand::GetInfo { reply }).await?;
        rx.await.map_err(|_| LifecycleError::Unavailable)
    }

    /// The most recently published state, without a round trip.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Subscribes to state changes (including every countdown tick).
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.clone()
    }

    /// Tells the actor to stop. Timers are dropped; the session record is
    /// left as it is.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        self.send(LifecycleCommand::Shutdown).await
    }

    async fn send(&self, cmd: LifecycleCommand) -> Result<(), LifecycleError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| LifecycleError::Unavailable)
    }
}

impl std::fmt::Debug for LifecycleCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start { .. } => "Start",
            Self::Extend { .. } => "Extend",
            Self::ForceLogout { .. } => "ForceLogout",
            Self::SetTimings { .. } => "SetTimings",
            Self::GetInfo { .. } => "GetInfo",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct LifecycleActor<A: AuthApi> {
    authority: Arc<SessionAuthority<A>>,
    config: LifecycleConfig,
    state: LifecycleState,
    generation: u64,
    timers: SessionTimers,
    /// Reply for the `extend()` whose refresh is in flight.
    pending_extend: Option<oneshot::Sender<bool>>,
    session: watch::Receiver<Option<SessionRecord>>,
    published: watch::Sender<LifecycleState>,
    receiver: mpsc::Receiver<LifecycleCommand>,
    refresh_tx: mpsc::UnboundedSender<RefreshDone>,
    refresh_rx: mpsc::UnboundedReceiver<RefreshDone>,
}

impl<A: AuthApi> LifecycleActor<A> {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!("lifecycle actor started");

        loop {
            tokio::select! {
                // Deadlines first: a deadline and a command that become
                // ready at the same instant are handled in that order.
                biased;

                (generation, event) = self.timers.wait() => {
                    self.handle_timer(generation, event);
                }
                Some(done) = self.refresh_rx.recv() => {
                    self.handle_refresh_done(done);
                }
                Ok(()) = self.session.changed() => {
                    self.handle_session_change();
                }
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    tracing::trace!(?cmd, state = %self.state, "lifecycle command");
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
            }
        }

        self.timers.cancel();
        tracing::info!("lifecycle actor stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: LifecycleCommand) -> bool {
        match cmd {
            LifecycleCommand::Start { reply } => {
                let _ = reply.send(self.start());
            }
            LifecycleCommand::Extend { reply } => self.extend(reply),
            LifecycleCommand::ForceLogout { reply } => {
                let _ = reply.send(self.force_logout("requested"));
            }
            LifecycleCommand::SetTimings { timings, reply } => {
                let _ = reply.send(self.set_timings(timings));
            }
            LifecycleCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            LifecycleCommand::Shutdown => {
                tracing::info!("lifecycle shutting down");
                return false;
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    fn start(&mut self) -> Result<(), LifecycleError> {
        if !self.authority.is_live() {
            return Err(LifecycleError::NoSession);
        }
        self.config.timings.validate()?;

        self.abandon_extend();
        self.generation += 1;
        // Arming drops the previous pair in the same step.
        self.timers.arm(self.config.timings, self.generation);
        self.set_state(LifecycleState::Active);
        tracing::info!(
            generation = self.generation,
            warning_after_secs = self.config.timings.warning_after.as_secs(),
            expire_after_secs = self.config.timings.expire_after.as_secs(),
            "session timers started"
        );
        Ok(())
    }

    fn extend(&mut self, reply: oneshot::Sender<bool>) {
        if !self.state.is_warning() {
            tracing::debug!(state = %self.state, "extend outside of warning ignored");
            let _ = reply.send(false);
            return;
        }

        self.timers.cancel();
        self.generation += 1;
        self.pending_extend = Some(reply);
        self.set_state(LifecycleState::Extending);
        tracing::info!(generation = self.generation, "extending session");

        let api = Arc::clone(self.authority.api());
        let tx = self.refresh_tx.clone();
        let generation = self.generation;
        let timeout = self.config.request_timeout;
        tokio::spawn(async move {
            let outcome = match time::timeout(timeout, api.refresh()).await {
                Ok(Ok(())) => RefreshOutcome::Refreshed,
                Ok(Err(e)) => RefreshOutcome::Failed(e.to_string()),
                Err(_) => RefreshOutcome::TimedOut,
            };
            // The actor may be gone; nothing left to tell.
            let _ = tx.send(RefreshDone {
                generation,
                outcome,
            });
        });
    }

    /// Ends the session. Returns `true` if there was anything to end.
    fn force_logout(&mut self, reason: &'static str) -> bool {
        let was = self.state;
        self.timers.cancel();
        self.generation += 1;
        self.abandon_extend();
        let cleared = self.authority.clear();

        if was.is_idle() && !cleared {
            tracing::debug!(reason, "force logout with no session, ignoring");
            return false;
        }

        self.set_state(LifecycleState::Idle);
        tracing::info!(reason, from = %was, "session terminated");
        self.spawn_remote_logout();
        true
    }

    fn set_timings(&mut self, timings: TimerConfig) -> Result<(), LifecycleError> {
        timings.validate()?;
        self.config.timings = timings;
        tracing::info!(
            warning_after_secs = timings.warning_after.as_secs(),
            expire_after_secs = timings.expire_after.as_secs(),
            "session timings updated"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal transitions
    // -----------------------------------------------------------------------

    fn handle_timer(&mut self, generation: u64, event: TimerEvent) {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, ?event, "stale timer event");
            return;
        }

        match event {
            TimerEvent::Warning { seconds_remaining } => {
                if self.state != LifecycleState::Active {
                    tracing::debug!(state = %self.state, "warning outside of active, ignoring");
                    return;
                }
                if !self.authority.is_live() {
                    tracing::debug!("session already gone, suppressing warning");
                    self.terminate_locally("session cleared before warning");
                    return;
                }
                self.set_state(LifecycleState::Warning { seconds_remaining });
                tracing::warn!(seconds_remaining, "session about to expire");
            }
            TimerEvent::Countdown { seconds_remaining } => {
                if self.state.is_warning() {
                    self.set_state(LifecycleState::Warning { seconds_remaining });
                }
            }
            TimerEvent::Expired => {
                if matches!(
                    self.state,
                    LifecycleState::Active | LifecycleState::Warning { .. }
                ) {
                    self.force_logout("expired");
                }
            }
        }
    }

    fn handle_refresh_done(&mut self, done: RefreshDone) {
        if done.generation != self.generation || self.state != LifecycleState::Extending {
            tracing::debug!(
                generation = done.generation,
                current = self.generation,
                state = %self.state,
                "discarding stale refresh result"
            );
            return;
        }

        match done.outcome {
            RefreshOutcome::Refreshed => {
                if !self.authority.renew() {
                    tracing::warn!("refresh succeeded but the session is gone");
                    self.force_logout("session cleared during refresh");
                    return;
                }
                let reply = self.pending_extend.take();
                let restarted = self.start().is_ok();
                if !restarted {
                    self.force_logout("restart after refresh failed");
                }
                if let Some(reply) = reply {
                    let _ = reply.send(restarted);
                }
            }
            RefreshOutcome::Failed(error) => {
                tracing::warn!(%error, "session refresh failed");
                self.force_logout("refresh failed");
            }
            RefreshOutcome::TimedOut => {
                tracing::warn!(
                    timeout_secs = self.config.request_timeout.as_secs_f64(),
                    "session refresh timed out"
                );
                self.force_logout("refresh timed out");
            }
        }
    }

    /// The authority was cleared by someone else (the request interceptor,
    /// a failed reauthorization). Tear down locally; whoever cleared it
    /// owns the consequences.
    fn handle_session_change(&mut self) {
        let live = self.session.borrow_and_update().is_some();
        if !live && !self.state.is_idle() {
            self.terminate_locally("session cleared externally");
        }
    }

    fn terminate_locally(&mut self, reason: &'static str) {
        let was = self.state;
        self.timers.cancel();
        self.generation += 1;
        self.abandon_extend();
        self.set_state(LifecycleState::Idle);
        tracing::info!(reason, from = %was, "session terminated");
    }

    fn abandon_extend(&mut self) {
        if let Some(reply) = self.pending_extend.take() {
            let _ = reply.send(false);
        }
    }

    fn spawn_remote_logout(&self) {
        let api = Arc::clone(self.authority.api());
        let timeout = self.config.request_timeout;
        tokio::spawn(async move {
            match time::timeout(timeout, api.logout()).await {
                Ok(Ok(())) => tracing::debug!("remote logout acknowledged"),
                Ok(Err(error)) => {
                    tracing::warn!(%error, "remote logout failed, local session already cleared");
                }
                Err(_) => tracing::warn!("remote logout timed out, local session already cleared"),
            }
        });
    }

    fn set_state(&mut self, state: LifecycleState) {
        self.state = state;
        self.published.send_replace(state);
    }

    fn info(&self) -> LifecycleInfo {
        LifecycleInfo {
            state: self.state,
            generation: self.generation,
            timings: self.config.timings,
            timers_armed: self.timers.is_armed(),
        }
    }
}

/// Spawns the lifecycle actor and returns a handle to it.
///
/// The actor starts `Idle`; call [`LifecycleHandle::start`] once a session
/// exists. It stops when [`LifecycleHandle::shutdown`] is called or every
/// handle has been dropped.
pub fn spawn_lifecycle<A: AuthApi>(
    authority: Arc<SessionAuthority<A>>,
    config: LifecycleConfig,
) -> LifecycleHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
    let (published, state) = watch::channel(LifecycleState::Idle);
    let session = authority.subscribe();

    let actor = LifecycleActor {
        authority,
        config,
        state: LifecycleState::Idle,
        generation: 0,
        timers: SessionTimers::new(),
        pending_extend: None,
        session,
        published,
        receiver: rx,
        refresh_tx,
        refresh_rx,
    };

    tokio::spawn(actor.run());

    LifecycleHandle { sender: tx, state }
}
