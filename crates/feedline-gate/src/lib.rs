//! Request interception and navigation guarding for Feedline.
//!
//! Two independent paths into the session lifecycle:
//!
//! - [`RequestInterceptor`] watches HTTP traffic and ends the session on
//!   any authorization failure
//! - [`NavigationGuard`] re-validates the session before protected routes
//!   are entered
//!
//! Both redirect through the application's [`Navigator`].

#![allow(async_fn_in_trait)]

mod error;
mod guard;
mod interceptor;
mod route;

pub use error::GateError;
pub use guard::{GuardConfig, GuardDecision, LandingPolicy, NavigationGuard};
pub use interceptor::{DEFAULT_EXEMPT, Intercepted, RequestInterceptor, RequestOutcome};
pub use route::{History, Navigator, Route};
