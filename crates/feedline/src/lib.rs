//! # Feedline
//!
//! Client-side session lifecycle core for the Feedline social feed.
//!
//! Feedline keeps one answer to "is the user logged in?" consistent across
//! the session timers, the warning dialog, every HTTP response and every
//! route change. The facade wires the layers together; the sub-crates can
//! also be used on their own.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use feedline::prelude::*;
//!
//! // Implement HttpTransport for your HTTP client and Navigator for your
//! // router, then:
//! // let client = FeedlineClientBuilder::new()
//! //     .config(ClientConfig::from_file("feedline.toml")?)
//! //     .build(transport, router)?;
//! // client.bootstrap().await?;
//! ```

mod client;
mod config;
mod error;
pub mod telemetry;

pub use client::{ClientAuth, ClientTransport, FeedlineClient, FeedlineClientBuilder};
pub use config::{ClientConfig, ConfigError, InterceptorSettings, NavigationSettings, SessionSettings};
pub use error::FeedlineError;

pub use feedline_gate as gate;
pub use feedline_lifecycle as lifecycle;
pub use feedline_protocol as protocol;
pub use feedline_session as session;
pub use feedline_timer as timer;
pub use feedline_transport as transport;

pub mod prelude {
    pub use crate::{ClientConfig, FeedlineClient, FeedlineClientBuilder, FeedlineError};
    pub use feedline_gate::{GuardDecision, History, LandingPolicy, Navigator, Route};
    pub use feedline_lifecycle::{LifecycleState, WarningPresenter, WarningPrompt};
    pub use feedline_protocol::{LoginCredentials, UserProfile};
    pub use feedline_session::{AuthApi, SessionAuthority};
    pub use feedline_timer::TimerConfig;
    pub use feedline_transport::{
        HttpRequest, HttpResponse, HttpTransport, StatusCode, TransportError,
    };
}
