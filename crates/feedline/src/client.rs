//! `FeedlineClient` builder and the top-level session flows.
//!
//! This ties the layers together: transport → auth collaborators →
//! session authority → lifecycle actor → interceptor and guard.

use std::sync::Arc;

use feedline_gate::{
    GuardDecision, Intercepted, NavigationGuard, Navigator, RequestInterceptor, Route,
};
use feedline_lifecycle::{LifecycleHandle, WarningPresenter, spawn_lifecycle};
use feedline_protocol::{LoginCredentials, UserProfile};
use feedline_session::{AuthApi, HttpAuthApi, SessionAuthority};
use feedline_timer::TimerConfig;
use feedline_transport::HttpTransport;

use crate::{ClientConfig, FeedlineError};

/// The auth collaborators used by the client: the backend's endpoints over
/// the raw (not intercepted) transport.
pub type ClientAuth<T> = HttpAuthApi<Arc<T>>;

/// The transport application code should use for its own requests.
pub type ClientTransport<T, N> = Intercepted<Arc<T>, ClientAuth<T>, Arc<N>>;

/// Builder for a [`FeedlineClient`].
///
/// # Example
///
/// ```rust,ignore
/// use feedline::prelude::*;
///
/// let client = FeedlineClientBuilder::new()
///     .config(ClientConfig::from_file("feedline.toml")?)
///     .build(my_transport, my_router)?;
/// client.bootstrap().await?;
/// ```
#[derive(Debug, Default)]
pub struct FeedlineClientBuilder {
    config: ClientConfig,
}

impl FeedlineClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration. Defaults to [`ClientConfig::default`].
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the configuration and wires the client together.
    ///
    /// Must be called inside a Tokio runtime: it spawns the lifecycle
    /// actor.
    pub fn build<T, N>(self, transport: T, navigator: N) -> Result<FeedlineClient<T, N>, FeedlineError>
    where
        T: HttpTransport,
        N: Navigator,
    {
        let config = self.config;
        config.validate()?;

        let transport = Arc::new(transport);
        let navigator = Arc::new(navigator);

        // Auth calls bypass the interceptor: a 401 from /autorizar is an
        // answer, not a reason to tear the session down.
        let api = Arc::new(HttpAuthApi::new(
            Arc::clone(&transport),
            config.api_base_url.clone(),
        ));
        let authority = Arc::new(SessionAuthority::new(api));
        let lifecycle = spawn_lifecycle(
            Arc::clone(&authority),
            config.session.lifecycle_config()?,
        );

        let guard = NavigationGuard::new(
            Arc::clone(&authority),
            Arc::clone(&navigator),
            config.navigation.guard_config(),
        );
        let http = RequestInterceptor::new(
            Arc::clone(&authority),
            lifecycle.clone(),
            Arc::clone(&navigator),
            config.navigation.landing.clone(),
        )
        .with_exempt(config.interceptor.exempt.iter().cloned())
        .wrap(transport);

        tracing::info!(
            api = %config.api_base_url,
            debug_mode = config.session.debug,
            "feedline client ready"
        );

        Ok(FeedlineClient {
            config,
            authority,
            lifecycle,
            guard,
            http,
            navigator,
        })
    }
}

/// A fully wired session client.
pub struct FeedlineClient<T: HttpTransport, N: Navigator> {
    config: ClientConfig,
    authority: Arc<SessionAuthority<ClientAuth<T>>>,
    lifecycle: LifecycleHandle,
    guard: NavigationGuard<ClientAuth<T>, Arc<N>>,
    http: ClientTransport<T, N>,
    navigator: Arc<N>,
}

impl<T: HttpTransport, N: Navigator> FeedlineClient<T, N> {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn authority(&self) -> &Arc<SessionAuthority<ClientAuth<T>>> {
        &self.authority
    }

    pub fn lifecycle(&self) -> &LifecycleHandle {
        &self.lifecycle
    }

    pub fn guard(&self) -> &NavigationGuard<ClientAuth<T>, Arc<N>> {
        &self.guard
    }

    /// The intercepted transport for application requests (publications,
    /// comments, profiles). A 401 on any of them ends the session.
    pub fn http(&self) -> &ClientTransport<T, N> {
        &self.http
    }

    pub fn navigator(&self) -> &Arc<N> {
        &self.navigator
    }

    /// A presenter for the session warning.
    pub fn presenter(&self) -> WarningPresenter {
        WarningPresenter::new(self.lifecycle.clone())
    }

    /// Startup: asks the backend whether the cookie from a previous visit
    /// is still valid and, if so, starts the session timers.
    pub async fn bootstrap(&self) -> Result<Option<UserProfile>, FeedlineError> {
        let identity = self.authority.reauthorize().await;
        match &identity {
            Some(user) => {
                tracing::info!(user_id = %user.id, "resuming session");
                self.lifecycle.start().await?;
            }
            None => tracing::info!("no session to resume"),
        }
        Ok(identity)
    }

    /// Logs in, starts the timers and moves to the feed.
    ///
    /// A rejected login leaves the state untouched and returns the
    /// backend's reason as [`FeedlineError::Session`]. If the timers can't
    /// be started the identity is cleared again.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<UserProfile, FeedlineError> {
        let user = self.authority.api().login(credentials).await?;
        self.authority.set_identity(user.clone());
        if let Err(error) = self.lifecycle.start().await {
            tracing::warn!(%error, "could not start session timers, dropping identity");
            self.authority.clear();
            return Err(error.into());
        }
        tracing::info!(user_id = %user.id, "logged in");
        self.navigator.redirect_to(&self.config.navigation.feed);
        Ok(user)
    }

    /// Explicit user logout. Always ends on the landing route.
    pub async fn logout(&self) -> Result<(), FeedlineError> {
        let ended = self.lifecycle.force_logout().await?;
        if !ended {
            tracing::debug!("logout with no session");
        }
        self.navigator.redirect_to(&self.config.navigation.landing);
        Ok(())
    }

    /// Runs the navigation guard for `route` and navigates accordingly.
    pub async fn navigate(&self, route: &Route) -> GuardDecision {
        self.guard.navigate(route).await
    }

    /// Switches between the debug timings (20 s / 30 s) and the configured
    /// ones. Takes effect at the next `start()`.
    pub async fn set_debug_mode(&self, enabled: bool) -> Result<TimerConfig, FeedlineError> {
        let timings = if enabled {
            TimerConfig::debug()
        } else {
            self.config.session.configured_timings()?
        };
        self.lifecycle.set_timings(timings).await?;
        tracing::warn!(
            debug_mode = enabled,
            expire_after_secs = timings.expire_after.as_secs(),
            "session debug mode changed"
        );
        Ok(timings)
    }

    /// Stops the lifecycle actor. The session record is left as is.
    pub async fn shutdown(&self) -> Result<(), FeedlineError> {
        self.lifecycle.shutdown().await?;
        Ok(())
    }
}
