//! Wire protocol for Feedline's authentication endpoints.
//!
//! - **Types** ([`UserProfile`], [`LoginCredentials`], [`AuthorizeResponse`],
//!   [`Ack`]) — the JSON bodies of `/login`, `/autorizar`, `/refrescar`
//!   and `/logout`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those bodies are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (envelopes) → Session (identity)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Ack, AuthorizeData, AuthorizeResponse, LoginCredentials, Role, UserId, UserProfile,
};
