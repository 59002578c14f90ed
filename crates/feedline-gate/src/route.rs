//! In-app routes and the navigation primitive.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::GateError;

/// An in-app route path, always starting with `/` and never ending with
/// one (except the root itself).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Route(String);

impl Route {
    /// Parses a route path.
    ///
    /// Accepts `"publicaciones"` as well as `"/publicaciones/"`; rejects
    /// empty strings, whitespace and absolute URLs.
    pub fn parse(path: &str) -> Result<Self, GateError> {
        let trimmed = path.trim();
        if trimmed.is_empty()
            || trimmed.contains("://")
            || trimmed.chars().any(char::is_whitespace)
        {
            return Err(GateError::InvalidRoute(path.to_string()));
        }
        let body = trimmed.trim_matches('/');
        Ok(Self(format!("/{body}")))
    }

    /// The unauthenticated landing page.
    pub fn home() -> Self {
        Self("/home".into())
    }

    pub fn login() -> Self {
        Self("/login".into())
    }

    pub fn register() -> Self {
        Self("/registro".into())
    }

    /// The publications feed, where users land after logging in.
    pub fn feed() -> Self {
        Self("/publicaciones".into())
    }

    pub fn profile() -> Self {
        Self("/mi-perfil".into())
    }

    pub fn not_found() -> Self {
        Self("/404".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if `self` is `prefix` or lies below it.
    ///
    /// Segment-aware: `/publicaciones/42` is under `/publicaciones`,
    /// `/publicacionesx` is not.
    pub fn is_under(&self, prefix: &Route) -> bool {
        if prefix.0 == "/" {
            return true;
        }
        match self.0.strip_prefix(prefix.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Route {
    type Error = GateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Route> for String {
    fn from(route: Route) -> Self {
        route.0
    }
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// The application's router, as far as the gate is concerned.
pub trait Navigator: Send + Sync + 'static {
    /// Moves the user to `route`.
    fn redirect_to(&self, route: &Route);
}

impl<N: Navigator> Navigator for Arc<N> {
    fn redirect_to(&self, route: &Route) {
        (**self).redirect_to(route)
    }
}

/// A navigator that just remembers where it was sent.
///
/// Enough for headless clients, the demo and tests.
#[derive(Debug, Default)]
pub struct History {
    visited: Mutex<Vec<Route>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// The route most recently navigated to.
    pub fn current(&self) -> Option<Route> {
        self.visited
            .lock()
            .ok()
            .and_then(|visited| visited.last().cloned())
    }

    /// Every route navigated to, oldest first.
    pub fn visited(&self) -> Vec<Route> {
        self.visited
            .lock()
            .map(|visited| visited.clone())
            .unwrap_or_default()
    }
}

impl Navigator for History {
    fn redirect_to(&self, route: &Route) {
        tracing::debug!(%route, "navigating");
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(route.clone());
        }
    }
}
