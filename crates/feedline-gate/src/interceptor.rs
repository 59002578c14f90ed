//! The request interceptor: end the session when the server says so.
//!
//! Sits in front of the real [`HttpTransport`]. Every response is sorted
//! into one [`RequestOutcome`]; an authorization failure from any endpoint
//! except login/registration clears the session, stops the lifecycle and
//! sends the user to the landing route. The original result is then handed
//! back unchanged so the caller can still show its own message.

use std::sync::Arc;

use feedline_lifecycle::LifecycleHandle;
use feedline_session::{AuthApi, SessionAuthority};
use feedline_transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

use crate::{Navigator, Route};

/// Path fragments whose 401s are expected (wrong password) and must not
/// end the session.
pub const DEFAULT_EXEMPT: &[&str] = &["/login", "/register"];

/// How one request ended, from the session's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// 2xx.
    Success,
    /// 401 from a non-exempt endpoint. Ends the session.
    AuthFailure,
    /// Any other status, including 401 from an exempt endpoint and 403.
    Rejected,
    /// No response at all.
    TransportFailure,
}

pub struct RequestInterceptor<A: AuthApi, N: Navigator> {
    authority: Arc<SessionAuthority<A>>,
    lifecycle: LifecycleHandle,
    navigator: N,
    landing: Route,
    exempt: Vec<String>,
}

impl<A: AuthApi, N: Navigator> RequestInterceptor<A, N> {
    pub fn new(
        authority: Arc<SessionAuthority<A>>,
        lifecycle: LifecycleHandle,
        navigator: N,
        landing: Route,
    ) -> Self {
        Self {
            authority,
            lifecycle,
            navigator,
            landing,
            exempt: DEFAULT_EXEMPT.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the exempt path fragments.
    pub fn with_exempt<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt = fragments.into_iter().map(Into::into).collect();
        self
    }

    /// `true` if the request's URL contains an exempt fragment.
    pub fn is_exempt(&self, request: &HttpRequest) -> bool {
        self.exempt
            .iter()
            .any(|fragment| request.url.contains(fragment.as_str()))
    }

    /// Sorts a finished request into one outcome. No side effects.
    pub fn classify(
        &self,
        request: &HttpRequest,
        result: &Result<HttpResponse, TransportError>,
    ) -> RequestOutcome {
        match result {
            Ok(_) => RequestOutcome::Success,
            Err(TransportError::Status { status, .. })
                if status.is_authorization_failure() && !self.is_exempt(request) =>
            {
                RequestOutcome::AuthFailure
            }
            Err(TransportError::Status { .. }) => RequestOutcome::Rejected,
            Err(TransportError::Unreachable(_) | TransportError::Timeout) => {
                RequestOutcome::TransportFailure
            }
        }
    }

    /// Classifies the request and, on an authorization failure, tears the
    /// session down.
    ///
    /// The lifecycle sees the `clear()` before the `force_logout()`, so it
    /// ends the session locally and the backend's logout is not called.
    pub async fn observe(
        &self,
        request: &HttpRequest,
        result: &Result<HttpResponse, TransportError>,
    ) -> RequestOutcome {
        let outcome = self.classify(request, result);
        if outcome == RequestOutcome::AuthFailure {
            tracing::warn!(
                method = %request.method,
                path = request.path(),
                "authorization failure, ending session"
            );
            self.invalidate().await;
        }
        outcome
    }

    async fn invalidate(&self) {
        self.authority.clear();
        if let Err(error) = self.lifecycle.force_logout().await {
            tracing::warn!(%error, "could not reach lifecycle manager");
        }
        self.navigator.redirect_to(&self.landing);
    }

    /// Puts this interceptor in front of `inner`.
    pub fn wrap<T: HttpTransport>(self, inner: T) -> Intercepted<T, A, N> {
        Intercepted {
            inner,
            interceptor: self,
        }
    }
}

/// An [`HttpTransport`] with a [`RequestInterceptor`] in front of it.
pub struct Intercepted<T, A: AuthApi, N: Navigator> {
    inner: T,
    interceptor: RequestInterceptor<A, N>,
}

impl<T: HttpTransport, A: AuthApi, N: Navigator> Intercepted<T, A, N> {
    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn interceptor(&self) -> &RequestInterceptor<A, N> {
        &self.interceptor
    }
}

impl<T: HttpTransport, A: AuthApi, N: Navigator> HttpTransport for Intercepted<T, A, N> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = self.inner.send(request.clone()).await;
        self.interceptor.observe(&request, &result).await;
        result
    }
}
