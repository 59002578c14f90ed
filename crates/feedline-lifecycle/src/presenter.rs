//! The session warning, as a view over the lifecycle state.
//!
//! The presenter holds no state of its own. It reads the state the
//! lifecycle actor publishes and forwards the user's two choices back to
//! it verbatim.

use std::fmt;

use tokio::sync::watch;

use crate::{LifecycleError, LifecycleHandle, LifecycleState};

/// What the warning shows while it is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningPrompt {
    pub seconds_remaining: u64,
    /// `seconds_remaining` as `MM:SS`.
    pub remaining_text: String,
}

impl WarningPrompt {
    fn new(seconds_remaining: u64) -> Self {
        Self {
            seconds_remaining,
            remaining_text: format_remaining(seconds_remaining),
        }
    }
}

impl fmt::Display for WarningPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Your session is about to expire ({})", self.remaining_text)
    }
}

/// Formats seconds as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours; 3600 seconds is `60:00`.
pub fn format_remaining(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Passive view over the lifecycle's warning state.
#[derive(Debug, Clone)]
pub struct WarningPresenter {
    lifecycle: LifecycleHandle,
    state: watch::Receiver<LifecycleState>,
}

impl WarningPresenter {
    pub fn new(lifecycle: LifecycleHandle) -> Self {
        let state = lifecycle.subscribe();
        Self { lifecycle, state }
    }

    /// The prompt to render, or `None` when the warning is closed.
    pub fn prompt(&self) -> Option<WarningPrompt> {
        self.state.borrow().seconds_remaining().map(WarningPrompt::new)
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().is_warning()
    }

    /// Waits for the next state change and returns the prompt to render
    /// after it.
    pub async fn changed(&mut self) -> Result<Option<WarningPrompt>, LifecycleError> {
        self.state
            .changed()
            .await
            .map_err(|_| LifecycleError::Unavailable)?;
        let prompt = self
            .state
            .borrow_and_update()
            .seconds_remaining()
            .map(WarningPrompt::new);
        Ok(prompt)
    }

    /// "Yes, extend my session."
    pub async fn extend(&self) -> Result<bool, LifecycleError> {
        self.lifecycle.extend().await
    }

    /// "No, log me out."
    pub async fn terminate(&self) -> Result<bool, LifecycleError> {
        self.lifecycle.force_logout().await
    }
}
