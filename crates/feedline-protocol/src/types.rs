//! Wire shapes of the authentication endpoints.
//!
//! These are the JSON bodies the backend's `/api/auth/*` routes send and
//! accept. The session core only needs a few of their fields (who the user
//! is, whether the server still considers the cookie valid), but the full
//! shapes are kept so the identity handed to the rest of the client carries
//! everything the profile and admin views read.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The backend's identifier for a user (a Mongo-style object id).
///
/// A newtype so it can't be confused with a user name or an email, both of
/// which are also strings. `#[serde(transparent)]` keeps it a plain string
/// on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// The profile (role) the backend assigns to a user.
///
/// The backend speaks Spanish on the wire. Any profile this client does not
/// know about deserializes as [`Role::Other`] instead of failing the whole
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Role {
    #[serde(rename = "administrador")]
    Admin,
    #[default]
    #[serde(rename = "usuario")]
    User,
    #[serde(other)]
    Other,
}

/// The authenticated user as the backend describes it.
///
/// This is the opaque "identity" the session authority stores. Nothing in
/// the session core looks inside it except for logging the id and the
/// admin check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile: Role,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl UserProfile {
    /// Returns `true` if the backend granted this user the admin profile.
    pub fn is_admin(&self) -> bool {
        self.profile == Role::Admin
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /login`.
///
/// `identificator` is either the user name or the email; the backend
/// accepts both.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub identificator: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(identificator: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identificator: identificator.into(),
            password: password.into(),
        }
    }
}

/// Hand-written so passwords never end up in logs.
impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("identificator", &self.identificator)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The `data` part of an authorization envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeData {
    #[serde(default)]
    pub user: Option<UserProfile>,
    /// Whether the session cookie is still valid. The login endpoint omits
    /// this field, which means valid.
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

/// Envelope returned by `POST /login` and `POST /autorizar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<AuthorizeData>,
}

impl AuthorizeResponse {
    /// Extracts the identity, if the response actually grants one.
    ///
    /// A 200 is not enough: the server also has to report `success`, mark
    /// the session `valid`, and include the user. Anything less means "no
    /// session".
    pub fn into_identity(self) -> Option<UserProfile> {
        if !self.success {
            return None;
        }
        match self.data {
            Some(AuthorizeData {
                user: Some(user),
                valid: true,
            }) => Some(user),
            _ => None,
        }
    }
}

/// Minimal acknowledgement returned by `/refrescar` and `/logout`.
///
/// Both endpoints are judged by their status code alone; the body is only
/// read for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}
