//! Integration tests for the lifecycle actor using a scripted auth backend.
//!
//! All timing tests run with paused time: the runtime auto-advances the
//! clock to the next deadline whenever every task is idle, so `t0 + 20s`
//! means exactly twenty simulated seconds after `start()`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use feedline_lifecycle::{
    spawn_lifecycle, LifecycleConfig, LifecycleError, LifecycleHandle, LifecycleState,
    TimerConfig, WarningPresenter,
};
use feedline_protocol::{LoginCredentials, Role, UserId, UserProfile};
use feedline_session::{AuthApi, SessionAuthority, SessionError};
use tokio::sync::oneshot;
use tokio::time::{self, Instant};

// =========================================================================
// Mock backend
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshMode {
    Succeed,
    Fail,
    Hang,
    Gated,
}

struct MockApi {
    refresh_mode: Mutex<RefreshMode>,
    refresh_gate: Mutex<Option<oneshot::Receiver<()>>>,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    logout_fails: AtomicBool,
}

impl MockApi {
    fn new() -> Self {
        Self {
            refresh_mode: Mutex::new(RefreshMode::Succeed),
            refresh_gate: Mutex::new(None),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            logout_fails: AtomicBool::new(false),
        }
    }

    fn set_refresh(&self, mode: RefreshMode) {
        *self.refresh_mode.lock().unwrap() = mode;
    }

    /// Makes the next refresh wait until the returned sender fires.
    fn gate_refresh(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.refresh_gate.lock().unwrap() = Some(rx);
        self.set_refresh(RefreshMode::Gated);
        tx
    }

    fn logouts(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

impl AuthApi for MockApi {
    async fn login(&self, _: &LoginCredentials) -> Result<UserProfile, SessionError> {
        Ok(user())
    }

    async fn refresh(&self) -> Result<(), SessionError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.refresh_mode.lock().unwrap();
        match mode {
            RefreshMode::Succeed => Ok(()),
            RefreshMode::Fail => Err(SessionError::Unauthorized),
            RefreshMode::Hang => std::future::pending().await,
            RefreshMode::Gated => {
                let gate = self.refresh_gate.lock().unwrap().take();
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                Ok(())
            }
        }
    }

    async fn reauthorize(&self) -> Result<Option<UserProfile>, SessionError> {
        Ok(Some(user()))
    }

    async fn logout(&self) -> Result<(), SessionError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails.load(Ordering::SeqCst) {
            Err(SessionError::Unauthorized)
        } else {
            Ok(())
        }
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn user() -> UserProfile {
    UserProfile {
        id: UserId("42".into()),
        email: "ana@example.com".into(),
        user_name: "ana".into(),
        name: None,
        last_name: None,
        profile: Role::User,
        active: true,
        profile_image_url: None,
        created_at: None,
    }
}

struct Harness {
    api: Arc<MockApi>,
    authority: Arc<SessionAuthority<MockApi>>,
    lifecycle: LifecycleHandle,
}

fn harness_with(config: LifecycleConfig) -> Harness {
    let api = Arc::new(MockApi::new());
    let authority = Arc::new(SessionAuthority::new(Arc::clone(&api)));
    let lifecycle = spawn_lifecycle(Arc::clone(&authority), config);
    Harness {
        api,
        authority,
        lifecycle,
    }
}

/// `w = 20s`, `e = 30s`.
fn harness() -> Harness {
    harness_with(LifecycleConfig {
        timings: TimerConfig::debug(),
        request_timeout: Duration::from_secs(2),
        ..LifecycleConfig::default()
    })
}

impl Harness {
    /// Logs in and starts the timers.
    async fn login(&self) {
        self.authority.set_identity(user());
        self.lifecycle.start().await.expect("start should succeed");
    }

    async fn state(&self) -> LifecycleState {
        self.lifecycle.snapshot().await.unwrap().state
    }
}

async fn at(t0: Instant, secs: u64) {
    time::sleep_until(t0 + Duration::from_secs(secs)).await;
}

/// Lets spawned best-effort tasks (remote logout) run.
async fn settle() {
    time::sleep(Duration::from_millis(1)).await;
}

// =========================================================================
// start()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_without_session_fails() {
    let h = harness();

    let result = h.lifecycle.start().await;

    assert!(matches!(result, Err(LifecycleError::NoSession)));
    assert_eq!(h.state().await, LifecycleState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_start_with_inverted_timings_fails_fast() {
    let h = harness_with(LifecycleConfig {
        timings: TimerConfig {
            warning_after: Duration::from_secs(30),
            expire_after: Duration::from_secs(20),
        },
        ..LifecycleConfig::default()
    });
    h.authority.set_identity(user());

    let result = h.lifecycle.start().await;

    assert!(matches!(result, Err(LifecycleError::InvalidTimings(_))));
    let info = h.lifecycle.snapshot().await.unwrap();
    assert_eq!(info.state, LifecycleState::Idle);
    assert!(!info.timers_armed);
}

#[tokio::test(start_paused = true)]
async fn test_start_with_expiration_past_maximum_fails_and_actor_survives() {
    let h = harness_with(LifecycleConfig {
        timings: TimerConfig {
            warning_after: Duration::from_secs(600),
            expire_after: Duration::from_secs(9_223_372_036_854_775_807),
        },
        ..LifecycleConfig::default()
    });
    h.authority.set_identity(user());

    let result = h.lifecycle.start().await;

    assert!(matches!(result, Err(LifecycleError::InvalidTimings(_))));
    assert!(matches!(h.lifecycle.force_logout().await, Ok(true)));
    assert!(!h.authority.is_live());
}

#[tokio::test(start_paused = true)]
async fn test_start_arms_timers_and_goes_active() {
    let h = harness();

    h.login().await;

    let info = h.lifecycle.snapshot().await.unwrap();
    assert_eq!(info.state, LifecycleState::Active);
    assert!(info.timers_armed);
    assert_eq!(h.lifecycle.state(), LifecycleState::Active);
}

#[tokio::test(start_paused = true)]
async fn test_start_during_warning_restarts_from_zero() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;

    at(t0, 20).await;
    assert!(h.state().await.is_warning());

    at(t0, 22).await;
    h.lifecycle.start().await.unwrap();
    assert_eq!(h.state().await, LifecycleState::Active);

    at(t0, 41).await;
    assert_eq!(h.state().await, LifecycleState::Active);
    at(t0, 42).await;
    assert_eq!(
        h.state().await,
        LifecycleState::Warning {
            seconds_remaining: 10
        }
    );
}

// =========================================================================
// Timer ordering
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_concrete_scenario_extend_at_25s_starts_fresh_cycle() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;

    at(t0, 19).await;
    assert_eq!(h.state().await, LifecycleState::Active);

    at(t0, 20).await;
    assert_eq!(
        h.state().await,
        LifecycleState::Warning {
            seconds_remaining: 10
        }
    );

    at(t0, 25).await;
    assert_eq!(
        h.state().await,
        LifecycleState::Warning {
            seconds_remaining: 5
        }
    );

    assert!(h.lifecycle.extend().await.unwrap());
    assert_eq!(h.state().await, LifecycleState::Active);
    assert_eq!(h.api.refresh_calls.load(Ordering::SeqCst), 1);

    // Original deadline passes without effect.
    at(t0, 30).await;
    assert_eq!(h.state().await, LifecycleState::Active);
    assert!(h.authority.is_live());

    at(t0, 44).await;
    assert_eq!(h.state().await, LifecycleState::Active);
    at(t0, 45).await;
    assert_eq!(
        h.state().await,
        LifecycleState::Warning {
            seconds_remaining: 10
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_concrete_scenario_without_extend_expires_at_30s() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;

    at(t0, 29).await;
    assert_eq!(
        h.state().await,
        LifecycleState::Warning {
            seconds_remaining: 1
        }
    );
    assert!(h.authority.is_live());

    at(t0, 30).await;
    assert_eq!(h.state().await, LifecycleState::Idle);
    assert!(h.authority.current_identity().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_expiration_fires_exactly_once() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;

    at(t0, 30).await;
    settle().await;
    at(t0, 120).await;

    assert_eq!(h.state().await, LifecycleState::Idle);
    assert_eq!(h.api.logouts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_sees_every_countdown_tick() {
    let h = harness();
    let mut rx = h.lifecycle.subscribe();
    h.login().await;

    let mut seen = Vec::new();
    while rx.changed().await.is_ok() {
        let state = *rx.borrow_and_update();
        if let Some(secs) = state.seconds_remaining() {
            seen.push(secs);
        }
        if state.is_idle() {
            break;
        }
    }

    assert_eq!(seen, (1..=10).rev().collect::<Vec<_>>());
}

// =========================================================================
// extend()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_extend_outside_warning_is_noop() {
    let h = harness();
    h.login().await;

    assert!(!h.lifecycle.extend().await.unwrap());

    assert_eq!(h.state().await, LifecycleState::Active);
    assert_eq!(h.api.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_extend_in_idle_is_noop() {
    let h = harness();

    assert!(!h.lifecycle.extend().await.unwrap());
    assert_eq!(h.state().await, LifecycleState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_extend_refresh_failure_terminates_session() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;
    h.api.set_refresh(RefreshMode::Fail);

    at(t0, 22).await;
    let extended = h.lifecycle.extend().await.unwrap();

    assert!(!extended);
    assert_eq!(h.state().await, LifecycleState::Idle);
    assert!(!h.authority.is_live());
    settle().await;
    assert_eq!(h.api.logouts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_extend_refresh_timeout_terminates_session() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;
    h.api.set_refresh(RefreshMode::Hang);

    at(t0, 21).await;
    let extended = h.lifecycle.extend().await.unwrap();

    assert!(!extended);
    // request_timeout is 2s.
    assert_eq!((Instant::now() - t0).as_secs(), 23);
    assert_eq!(h.state().await, LifecycleState::Idle);
    assert!(!h.authority.is_live());
}

#[tokio::test(start_paused = true)]
async fn test_extend_result_discarded_after_logout() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;
    let gate = h.api.gate_refresh();

    at(t0, 21).await;
    let extend = tokio::spawn({
        let lifecycle = h.lifecycle.clone();
        async move { lifecycle.extend().await }
    });
    while h.api.refresh_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.state().await, LifecycleState::Extending);

    // The user logs out while the refresh is still in flight.
    assert!(h.lifecycle.force_logout().await.unwrap());
    assert!(!extend.await.unwrap().unwrap());

    gate.send(()).unwrap();
    settle().await;

    let info = h.lifecycle.snapshot().await.unwrap();
    assert_eq!(info.state, LifecycleState::Idle);
    assert!(!info.timers_armed);
    assert!(!h.authority.is_live());
}

#[tokio::test(start_paused = true)]
async fn test_extend_succeeds_but_session_cleared_meanwhile_terminates() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;
    let gate = h.api.gate_refresh();

    at(t0, 21).await;
    let extend = tokio::spawn({
        let lifecycle = h.lifecycle.clone();
        async move { lifecycle.extend().await }
    });
    while h.api.refresh_calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    h.authority.clear();
    gate.send(()).unwrap();

    assert!(!extend.await.unwrap().unwrap());
    assert_eq!(h.state().await, LifecycleState::Idle);
    assert!(!h.authority.is_live());
}

// =========================================================================
// force_logout()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_force_logout_repeated_calls_transition_once() {
    let h = harness();
    h.login().await;

    let results = [
        h.lifecycle.force_logout().await.unwrap(),
        h.lifecycle.force_logout().await.unwrap(),
        h.lifecycle.force_logout().await.unwrap(),
    ];
    settle().await;

    assert_eq!(results, [true, false, false]);
    assert_eq!(h.state().await, LifecycleState::Idle);
    assert!(h.authority.current_identity().is_none());
    assert_eq!(h.api.logouts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_logout_from_warning_closes_warning() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;

    at(t0, 20).await;
    assert!(h.lifecycle.force_logout().await.unwrap());

    let info = h.lifecycle.snapshot().await.unwrap();
    assert_eq!(info.state, LifecycleState::Idle);
    assert!(!info.timers_armed);
}

#[tokio::test(start_paused = true)]
async fn test_force_logout_in_idle_with_live_session_clears_it() {
    let h = harness();
    h.authority.set_identity(user());

    assert!(h.lifecycle.force_logout().await.unwrap());
    assert!(!h.lifecycle.force_logout().await.unwrap());
    settle().await;

    assert!(!h.authority.is_live());
    assert_eq!(h.api.logouts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_logout_with_nothing_live_is_noop() {
    let h = harness();

    assert!(!h.lifecycle.force_logout().await.unwrap());
    settle().await;

    assert_eq!(h.api.logouts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_force_logout_remote_failure_still_clears_locally() {
    let h = harness();
    h.api.logout_fails.store(true, Ordering::SeqCst);
    h.login().await;

    assert!(h.lifecycle.force_logout().await.unwrap());
    settle().await;

    assert_eq!(h.api.logouts(), 1);
    assert_eq!(h.state().await, LifecycleState::Idle);
    assert!(!h.authority.is_live());
}

// =========================================================================
// Race safety
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_logout_before_warning_leaves_pending_deadlines_inert() {
    let h = harness();
    let mut rx = h.lifecycle.subscribe();
    let t0 = Instant::now();
    h.login().await;

    at(t0, 5).await;
    assert!(h.lifecycle.force_logout().await.unwrap());
    rx.borrow_and_update();

    at(t0, 20).await;
    assert_eq!(h.state().await, LifecycleState::Idle);
    at(t0, 30).await;
    assert_eq!(h.state().await, LifecycleState::Idle);
    settle().await;

    assert!(!rx.has_changed().unwrap(), "no state change after logout");
    assert_eq!(h.api.logouts(), 1, "expiration must not log out again");
}

#[tokio::test(start_paused = true)]
async fn test_authority_cleared_externally_stops_timers() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;

    at(t0, 5).await;
    // Interceptor path: clear first, then force_logout.
    h.authority.clear();
    let transitioned = h.lifecycle.force_logout().await.unwrap();

    assert!(!transitioned, "the clear already ended the session");
    let info = h.lifecycle.snapshot().await.unwrap();
    assert_eq!(info.state, LifecycleState::Idle);
    assert!(!info.timers_armed);

    at(t0, 31).await;
    assert_eq!(h.state().await, LifecycleState::Idle);
    assert!(!h.authority.is_live());
}

#[tokio::test(start_paused = true)]
async fn test_login_again_after_logout_runs_new_cycle() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;
    at(t0, 5).await;
    h.lifecycle.force_logout().await.unwrap();

    at(t0, 10).await;
    h.login().await;

    at(t0, 29).await;
    assert_eq!(h.state().await, LifecycleState::Active);
    at(t0, 30).await;
    assert!(h.state().await.is_warning());
}

// =========================================================================
// set_timings()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_set_timings_rejects_invalid() {
    let h = harness();

    let result = h
        .lifecycle
        .set_timings(TimerConfig {
            warning_after: Duration::from_secs(30),
            expire_after: Duration::from_secs(30),
        })
        .await;

    assert!(matches!(result, Err(LifecycleError::InvalidTimings(_))));
    assert_eq!(
        h.lifecycle.snapshot().await.unwrap().timings,
        TimerConfig::debug()
    );
}

#[tokio::test(start_paused = true)]
async fn test_set_timings_applies_on_next_start() {
    let h = harness();
    let t0 = Instant::now();
    h.login().await;

    h.lifecycle
        .set_timings(TimerConfig::from_secs(5, 8).unwrap())
        .await
        .unwrap();

    at(t0, 6).await;
    assert_eq!(h.state().await, LifecycleState::Active, "running cycle keeps its deadlines");

    h.lifecycle.start().await.unwrap();
    at(t0, 11).await;
    assert_eq!(
        h.state().await,
        LifecycleState::Warning {
            seconds_remaining: 3
        }
    );
}

// =========================================================================
// Presenter
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_presenter_hidden_until_warning() {
    let h = harness();
    let presenter = WarningPresenter::new(h.lifecycle.clone());
    let t0 = Instant::now();
    h.login().await;

    at(t0, 19).await;
    h.state().await;
    assert!(presenter.prompt().is_none());
    assert!(!presenter.is_visible());

    at(t0, 20).await;
    h.state().await;
    let prompt = presenter.prompt().expect("warning should be visible");
    assert_eq!(prompt.seconds_remaining, 10);
    assert_eq!(prompt.remaining_text, "00:10");
}

#[tokio::test(start_paused = true)]
async fn test_presenter_terminate_forwards_to_force_logout() {
    let h = harness();
    let presenter = WarningPresenter::new(h.lifecycle.clone());
    let t0 = Instant::now();
    h.login().await;

    at(t0, 25).await;
    assert!(presenter.terminate().await.unwrap());

    assert!(presenter.prompt().is_none());
    assert!(!h.authority.is_live());
}

#[tokio::test(start_paused = true)]
async fn test_presenter_extend_closes_warning() {
    let h = harness();
    let mut presenter = WarningPresenter::new(h.lifecycle.clone());
    h.login().await;

    let prompt = loop {
        if let Some(prompt) = presenter.changed().await.unwrap() {
            break prompt;
        }
    };
    assert_eq!(prompt.remaining_text, "00:10");

    assert!(presenter.extend().await.unwrap());
    assert!(presenter.prompt().is_none());
    assert_eq!(h.state().await, LifecycleState::Active);
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_makes_handle_unavailable() {
    let h = harness();
    h.lifecycle.shutdown().await.unwrap();
    settle().await;

    let result = h.lifecycle.snapshot().await;

    assert!(matches!(result, Err(LifecycleError::Unavailable)));
}
