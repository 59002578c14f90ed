//! The authentication collaborators the session core depends on.
//!
//! Feedline doesn't authenticate anyone itself. The backend owns the
//! session (an HTTP-only cookie) and exposes four endpoints; the core only
//! needs to call them. [`AuthApi`] is that seam: [`HttpAuthApi`] talks to
//! the real backend, tests plug in a scripted one.
//!
//! [`HttpAuthApi`]: crate::HttpAuthApi

use std::future::Future;

use feedline_protocol::{LoginCredentials, UserProfile};

use crate::SessionError;

/// The backend's authentication endpoints.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because one instance is shared (behind an `Arc`)
/// by the session authority, the lifecycle actor, the navigation guard and
/// startup code, and its futures are spawned onto the runtime.
///
/// # Example
///
/// ```rust
/// use feedline_protocol::{LoginCredentials, UserId, UserProfile, Role};
/// use feedline_session::{AuthApi, SessionError};
///
/// /// Logs everyone in as the same user. Development only.
/// struct DevAuth;
///
/// fn dev_user() -> UserProfile {
///     UserProfile {
///         id: UserId("dev".into()),
///         email: "dev@localhost".into(),
///         user_name: "dev".into(),
///         name: None,
///         last_name: None,
///         profile: Role::User,
///         active: true,
///         profile_image_url: None,
///         created_at: None,
///     }
/// }
///
/// impl AuthApi for DevAuth {
///     async fn login(&self, _: &LoginCredentials) -> Result<UserProfile, SessionError> {
///         Ok(dev_user())
///     }
///     async fn refresh(&self) -> Result<(), SessionError> {
///         Ok(())
///     }
///     async fn reauthorize(&self) -> Result<Option<UserProfile>, SessionError> {
///         Ok(Some(dev_user()))
///     }
///     async fn logout(&self) -> Result<(), SessionError> {
///         Ok(())
///     }
/// }
/// ```
pub trait AuthApi: Send + Sync + 'static {
    /// Exchanges credentials for an identity.
    ///
    /// Called by code outside the core (the login form). Its success is
    /// what first starts the lifecycle timers.
    fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> impl Future<Output = Result<UserProfile, SessionError>> + Send;

    /// Extends the server-side validity of the current session.
    ///
    /// Must not change anything else. Used by the lifecycle manager's
    /// `extend()`.
    fn refresh(&self) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Asks the server whether the current cookie is still valid.
    ///
    /// # Returns
    /// - `Ok(Some(user))` — valid, here's who it belongs to
    /// - `Ok(None)` — not authenticated. This is never an error.
    /// - `Err(_)` — the question couldn't be answered (network, server)
    fn reauthorize(
        &self,
    ) -> impl Future<Output = Result<Option<UserProfile>, SessionError>> + Send;

    /// Ends the session server-side. Best effort from the core's point of
    /// view: local invalidation never waits on it.
    fn logout(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}
