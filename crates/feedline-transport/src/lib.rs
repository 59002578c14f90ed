//! HTTP transport boundary for Feedline.
//!
//! The session core never talks to the network directly. Everything that
//! leaves the client goes through an [`HttpTransport`], which lets the
//! request interceptor sit in front of the real client and lets tests swap
//! in a scripted backend.
//!
//! # Status handling contract
//!
//! Implementations return `Ok` only for 2xx responses. Any other status the
//! server answers with is reported as [`TransportError::Status`], so that
//! "the server said no" and "the server was never reached" stay distinct
//! all the way up to the interceptor. [`HttpResponse::into_result`] does the
//! mapping for implementors.

#![allow(async_fn_in_trait)]

mod error;

pub use error::TransportError;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// An HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const BAD_REQUEST: Self = Self(400);
    pub const UNAUTHORIZED: Self = Self(401);
    pub const FORBIDDEN: Self = Self(403);
    pub const NOT_FOUND: Self = Self(404);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Creates a `StatusCode` from a raw `u16`.
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the underlying `u16` value.
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// `true` for 2xx.
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    /// `true` if the server rejected the caller's credentials.
    ///
    /// Only 401 counts. A 403 means the identity is valid but lacks
    /// permission, which must not end the session.
    pub fn is_authorization_failure(self) -> bool {
        self == Self::UNAUTHORIZED
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.0)
    }
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Encoded body, if any. The auth endpoints use JSON.
    pub body: Option<Vec<u8>>,
    /// Send and accept cookies. The session lives in an HTTP-only cookie,
    /// so every auth call sets this.
    pub with_credentials: bool,
}

impl HttpRequest {
    /// A `POST` with credentials and the given body.
    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
            with_credentials: true,
        }
    }

    /// A `GET` with credentials and no body.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
            with_credentials: true,
        }
    }

    /// The path part of the URL (everything after scheme and host),
    /// without query string.
    pub fn path(&self) -> &str {
        let rest = match self.url.find("://") {
            Some(i) => &self.url[i + 3..],
            None => self.url.as_str(),
        };
        let path = match rest.find('/') {
            Some(i) if self.url.contains("://") => &rest[i..],
            Some(_) => rest,
            None => "/",
        };
        path.split('?').next().unwrap_or(path)
    }
}

/// A response the server answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Converts a non-2xx response into [`TransportError::Status`].
    pub fn into_result(self) -> Result<Self, TransportError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Sends requests to the backend.
///
/// Implement it over whatever HTTP client the application already uses;
/// the session code only relies on this contract. See the crate docs for
/// how statuses map to results.
pub trait HttpTransport: Send + Sync + 'static {
    /// Sends one request and waits for its response.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: HttpTransport> HttpTransport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}
