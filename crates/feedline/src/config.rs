//! Client configuration, loaded from TOML.
//!
//! Every section has defaults, so an empty file is a valid configuration:
//!
//! ```toml
//! api_base_url = "https://api.feedline.example/api/auth"
//!
//! [session]
//! warning_after_secs = 600
//! expire_after_secs = 900
//! refresh_timeout_secs = 10
//! debug = false
//!
//! [navigation]
//! landing = "/home"
//! feed = "/publicaciones"
//! protected = ["/publicaciones", "/mi-perfil"]
//! authenticated_landing = "stay"
//! reauthorize_timeout_secs = 10
//!
//! [interceptor]
//! exempt = ["/login", "/register"]
//! ```

use std::path::Path;
use std::time::Duration;

use feedline_gate::{DEFAULT_EXEMPT, GateError, GuardConfig, LandingPolicy, Route};
use feedline_lifecycle::LifecycleConfig;
use feedline_timer::{TimerConfig, TimerError};
use serde::{Deserialize, Serialize};

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Timings(#[from] TimerError),

    #[error(transparent)]
    Routes(#[from] GateError),
}

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend's auth routes (`…/api/auth`).
    pub api_base_url: String,
    pub session: SessionSettings,
    pub navigation: NavigationSettings,
    pub interceptor: InterceptorSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api/auth".to_string(),
            session: SessionSettings::default(),
            navigation: NavigationSettings::default(),
            interceptor: InterceptorSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Loads and validates a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".into()));
        }
        self.session.configured_timings()?;
        if self.session.refresh_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "session.refresh_timeout_secs must be > 0".into(),
            ));
        }
        self.navigation.guard_config().validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Session timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seconds after login (or extend) before the warning opens.
    pub warning_after_secs: u64,
    /// Seconds after login (or extend) before the session expires.
    pub expire_after_secs: u64,
    /// Upper bound on the refresh and logout round trips.
    pub refresh_timeout_secs: u64,
    /// Use the short debug timings (20 s / 30 s) instead of the ones above.
    pub debug: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let production = TimerConfig::production();
        Self {
            warning_after_secs: production.warning_after.as_secs(),
            expire_after_secs: production.expire_after.as_secs(),
            refresh_timeout_secs: 10,
            debug: false,
        }
    }
}

impl SessionSettings {
    /// The timings written in the config, ignoring `debug`.
    pub fn configured_timings(&self) -> Result<TimerConfig, TimerError> {
        TimerConfig::from_secs(self.warning_after_secs, self.expire_after_secs)
    }

    /// The timings in effect.
    pub fn timings(&self) -> Result<TimerConfig, TimerError> {
        if self.debug {
            Ok(TimerConfig::debug())
        } else {
            self.configured_timings()
        }
    }

    pub fn lifecycle_config(&self) -> Result<LifecycleConfig, TimerError> {
        Ok(LifecycleConfig {
            timings: self.timings()?,
            request_timeout: Duration::from_secs(self.refresh_timeout_secs),
            ..LifecycleConfig::default()
        })
    }
}

/// Routes and guard behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// Where unauthenticated users are sent.
    pub landing: Route,
    /// Where users go after logging in.
    pub feed: Route,
    /// Route prefixes that need a session.
    pub protected: Vec<Route>,
    /// What to do with a logged-in user who opens the landing page.
    pub authenticated_landing: LandingPolicy,
    pub reauthorize_timeout_secs: u64,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        let guard = GuardConfig::default();
        Self {
            landing: guard.landing,
            feed: Route::feed(),
            protected: guard.protected,
            authenticated_landing: guard.authenticated_landing,
            reauthorize_timeout_secs: guard.reauthorize_timeout.as_secs(),
        }
    }
}

impl NavigationSettings {
    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig {
            landing: self.landing.clone(),
            protected: self.protected.clone(),
            authenticated_landing: self.authenticated_landing.clone(),
            reauthorize_timeout: Duration::from_secs(self.reauthorize_timeout_secs),
        }
    }
}

/// Request interceptor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorSettings {
    /// URL fragments whose 401 responses don't end the session.
    pub exempt: Vec<String>,
}

impl Default for InterceptorSettings {
    fn default() -> Self {
        Self {
            exempt: DEFAULT_EXEMPT.iter().map(|s| s.to_string()).collect(),
        }
    }
}
