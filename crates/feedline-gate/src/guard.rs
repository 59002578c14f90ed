//! The navigation guard: gate entry to protected routes.
//!
//! Every attempt to enter a protected route triggers a round-trip
//! reauthorization; a cached "logged in" flag can be stale relative to the
//! server-side session. The guard always decides within
//! `reauthorize_timeout` and treats every failure as "no session".

use std::sync::Arc;
use std::time::Duration;

use feedline_session::{AuthApi, SessionAuthority};
use serde::{Deserialize, Serialize};
use tokio::time;

use crate::{GateError, Navigator, Route};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do with an authenticated user who opens the landing route.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandingPolicy {
    /// Let them see the landing page.
    #[default]
    Stay,
    /// Send them somewhere else, typically the feed.
    RedirectTo(Route),
}

/// Guard configuration.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Where unauthenticated users are sent.
    pub landing: Route,
    /// Route prefixes that require a session.
    pub protected: Vec<Route>,
    /// Policy for authenticated users entering `landing`.
    pub authenticated_landing: LandingPolicy,
    /// Upper bound on the reauthorization round trip. Hitting it counts as
    /// "no session".
    pub reauthorize_timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            landing: Route::home(),
            protected: vec![Route::feed(), Route::profile()],
            authenticated_landing: LandingPolicy::Stay,
            reauthorize_timeout: Duration::from_secs(10),
        }
    }
}

impl GuardConfig {
    /// `true` if entering `route` requires a session.
    pub fn is_protected(&self, route: &Route) -> bool {
        self.protected.iter().any(|prefix| route.is_under(prefix))
    }

    pub fn validate(&self) -> Result<(), GateError> {
        if self.is_protected(&self.landing) {
            return Err(GateError::LandingProtected(self.landing.clone()));
        }
        if self.reauthorize_timeout.is_zero() {
            return Err(GateError::ZeroTimeout);
        }
        Ok(())
    }
}

/// The guard's verdict for one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

// ---------------------------------------------------------------------------
// NavigationGuard
// ---------------------------------------------------------------------------

pub struct NavigationGuard<A: AuthApi, N: Navigator> {
    authority: Arc<SessionAuthority<A>>,
    navigator: N,
    config: GuardConfig,
}

impl<A: AuthApi, N: Navigator> NavigationGuard<A, N> {
    pub fn new(authority: Arc<SessionAuthority<A>>, navigator: N, config: GuardConfig) -> Self {
        Self {
            authority,
            navigator,
            config,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Decides whether `route` may be entered.
    ///
    /// Unprotected routes are allowed without a round trip, except the
    /// landing route under [`LandingPolicy::RedirectTo`], which needs to
    /// know whether the user is logged in.
    pub async fn can_activate(&self, route: &Route) -> GuardDecision {
        if *route == self.config.landing {
            if let LandingPolicy::RedirectTo(target) = &self.config.authenticated_landing {
                if self.reauthorized(route).await {
                    tracing::debug!(%route, %target, "authenticated user on landing, redirecting");
                    return GuardDecision::Redirect(target.clone());
                }
            }
            return GuardDecision::Allow;
        }

        if !self.config.is_protected(route) {
            return GuardDecision::Allow;
        }

        if self.reauthorized(route).await {
            GuardDecision::Allow
        } else {
            tracing::info!(%route, landing = %self.config.landing, "no session, redirecting");
            GuardDecision::Redirect(self.config.landing.clone())
        }
    }

    /// Navigates to `route`, or to wherever the guard redirects instead.
    pub async fn navigate(&self, route: &Route) -> GuardDecision {
        let decision = self.can_activate(route).await;
        let target = match &decision {
            GuardDecision::Allow => route,
            GuardDecision::Redirect(target) => target,
        };
        self.navigator.redirect_to(target);
        decision
    }

    async fn reauthorized(&self, route: &Route) -> bool {
        match time::timeout(self.config.reauthorize_timeout, self.authority.reauthorize()).await {
            Ok(Some(user)) => {
                tracing::debug!(%route, user_id = %user.id, "guard: session confirmed");
                true
            }
            Ok(None) => false,
            Err(_) => {
                tracing::warn!(
                    %route,
                    timeout_secs = self.config.reauthorize_timeout.as_secs_f64(),
                    "guard: reauthorization timed out, treating as no session"
                );
                false
            }
        }
    }
}
