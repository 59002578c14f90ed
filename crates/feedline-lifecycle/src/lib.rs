//! Session lifecycle management for Feedline.
//!
//! The lifecycle runs as an isolated Tokio task (actor model) that owns the
//! warning/expiration timers of the current session and decides when the
//! warning opens, when the session is extended and when it ends.
//!
//! # Key types
//!
//! - [`spawn_lifecycle`] — starts the actor for a session authority
//! - [`LifecycleHandle`] — send commands to the running actor
//! - [`LifecycleState`] — `Idle` / `Active` / `Warning` / `Extending`
//! - [`WarningPresenter`] — the countdown view and its two buttons
//! - [`LifecycleConfig`] — timings and round-trip limits

mod config;
mod error;
mod manager;
mod presenter;

pub use config::{LifecycleConfig, LifecycleState};
pub use error::LifecycleError;
pub use feedline_timer::TimerConfig;
pub use manager::{LifecycleHandle, LifecycleInfo, spawn_lifecycle};
pub use presenter::{WarningPresenter, WarningPrompt, format_remaining};
