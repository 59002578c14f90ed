//! Session state and authentication collaborators for Feedline.
//!
//! 1. **Authority** — the one place that knows who is logged in
//!    ([`SessionAuthority`]), observable through a `watch` channel
//! 2. **Collaborators** — the backend's auth endpoints behind the
//!    [`AuthApi`] trait, with an HTTP implementation ([`HttpAuthApi`])
//! 3. **Classification** — every reauthorization sorted into one
//!    [`AuthOutcome`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Lifecycle / Gate (above)  ← start timers, force logout, guard routes
//!     ↕
//! Session Layer (this crate)  ← owns the SessionRecord
//!     ↕
//! Protocol + Transport (below)  ← UserProfile, HttpTransport
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod authority;
mod error;
mod http;
mod outcome;
mod record;

pub use auth::AuthApi;
pub use authority::SessionAuthority;
pub use error::SessionError;
pub use http::HttpAuthApi;
pub use outcome::AuthOutcome;
pub use record::SessionRecord;
