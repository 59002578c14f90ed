//! Integration tests for `HttpAuthApi` against a scripted transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use feedline_protocol::LoginCredentials;
use feedline_session::{AuthApi, HttpAuthApi, SessionError};
use feedline_transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, StatusCode, TransportError,
};

// =========================================================================
// Scripted transport
// =========================================================================

/// Replays canned responses in order and records every request.
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn replying(replies: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(TransportError::Unreachable("no scripted reply".into())));
        reply.and_then(HttpResponse::into_result)
    }
}

fn ok(json: serde_json::Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(StatusCode::OK, serde_json::to_vec(&json).unwrap()))
}

fn status(code: StatusCode, json: serde_json::Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(code, serde_json::to_vec(&json).unwrap()))
}

fn user_json() -> serde_json::Value {
    serde_json::json!({
        "_id": "42",
        "email": "ana@example.com",
        "userName": "ana",
        "profile": "usuario",
        "active": true
    })
}

fn api(transport: &Arc<ScriptedTransport>) -> HttpAuthApi<Arc<ScriptedTransport>> {
    HttpAuthApi::new(Arc::clone(transport), "https://api.example.com/api/auth/")
}

// =========================================================================
// login()
// =========================================================================

#[tokio::test]
async fn test_login_posts_credentials_and_returns_user() {
    let transport = ScriptedTransport::replying(vec![ok(serde_json::json!({
        "success": true,
        "message": "Login exitoso",
        "data": { "user": user_json() }
    }))]);

    let user = api(&transport)
        .login(&LoginCredentials::new("ana", "Secret123"))
        .await
        .expect("login should succeed");

    assert_eq!(user.user_name, "ana");
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].url, "https://api.example.com/api/auth/login");
    assert!(requests[0].with_credentials);
    let sent: serde_json::Value =
        serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(sent["identificator"], "ana");
}

#[tokio::test]
async fn test_login_401_returns_auth_failed_with_server_message() {
    let transport = ScriptedTransport::replying(vec![status(
        StatusCode::UNAUTHORIZED,
        serde_json::json!({ "message": "Credenciales incorrectas" }),
    )]);

    let result = api(&transport)
        .login(&LoginCredentials::new("ana", "wrong"))
        .await;

    assert!(
        matches!(&result, Err(SessionError::AuthFailed(m)) if m == "Credenciales incorrectas"),
        "got {result:?}"
    );
}

#[tokio::test]
async fn test_login_unsuccessful_envelope_returns_auth_failed() {
    let transport = ScriptedTransport::replying(vec![ok(serde_json::json!({
        "success": false,
        "message": "Usuario inactivo"
    }))]);

    let result = api(&transport)
        .login(&LoginCredentials::new("ana", "Secret123"))
        .await;

    assert!(matches!(result, Err(SessionError::AuthFailed(m)) if m == "Usuario inactivo"));
}

#[tokio::test]
async fn test_login_offline_returns_transport_error() {
    let transport = ScriptedTransport::replying(vec![Err(TransportError::Timeout)]);

    let result = api(&transport)
        .login(&LoginCredentials::new("ana", "Secret123"))
        .await;

    assert!(matches!(result, Err(SessionError::Transport(TransportError::Timeout))));
}

// =========================================================================
// reauthorize()
// =========================================================================

#[tokio::test]
async fn test_reauthorize_valid_cookie_returns_user() {
    let transport = ScriptedTransport::replying(vec![ok(serde_json::json!({
        "success": true,
        "message": "ok",
        "data": { "user": user_json(), "valid": true }
    }))]);

    let user = api(&transport).reauthorize().await.unwrap();

    assert_eq!(user.map(|u| u.user_name), Some("ana".to_string()));
    assert_eq!(
        transport.requests()[0].url,
        "https://api.example.com/api/auth/autorizar"
    );
}

#[tokio::test]
async fn test_reauthorize_401_is_none_not_error() {
    let transport = ScriptedTransport::replying(vec![status(
        StatusCode::UNAUTHORIZED,
        serde_json::json!({ "message": "Token inválido" }),
    )]);

    let result = api(&transport).reauthorize().await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_reauthorize_server_error_is_error() {
    let transport = ScriptedTransport::replying(vec![status(
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({}),
    )]);

    let result = api(&transport).reauthorize().await;

    assert!(matches!(result, Err(SessionError::Transport(_))));
}

#[tokio::test]
async fn test_reauthorize_invalid_flag_is_none() {
    let transport = ScriptedTransport::replying(vec![ok(serde_json::json!({
        "success": true,
        "message": "expired",
        "data": { "user": user_json(), "valid": false }
    }))]);

    assert!(matches!(api(&transport).reauthorize().await, Ok(None)));
}

// =========================================================================
// refresh() / logout()
// =========================================================================

#[tokio::test]
async fn test_refresh_posts_to_refrescar() {
    let transport =
        ScriptedTransport::replying(vec![ok(serde_json::json!({ "message": "refrescado" }))]);

    api(&transport).refresh().await.expect("refresh should succeed");

    assert_eq!(
        transport.requests()[0].url,
        "https://api.example.com/api/auth/refrescar"
    );
}

#[tokio::test]
async fn test_refresh_empty_body_still_succeeds() {
    let transport = ScriptedTransport::replying(vec![Ok(HttpResponse::new(
        StatusCode::OK,
        Vec::new(),
    ))]);

    assert!(api(&transport).refresh().await.is_ok());
}

#[tokio::test]
async fn test_refresh_401_is_unauthorized() {
    let transport = ScriptedTransport::replying(vec![status(
        StatusCode::UNAUTHORIZED,
        serde_json::json!({}),
    )]);

    let result = api(&transport).refresh().await;

    assert!(matches!(result, Err(SessionError::Unauthorized)));
}

#[tokio::test]
async fn test_logout_posts_to_logout() {
    let transport = ScriptedTransport::replying(vec![ok(serde_json::json!({}))]);

    api(&transport).logout().await.expect("logout should succeed");

    assert_eq!(
        transport.requests()[0].url,
        "https://api.example.com/api/auth/logout"
    );
}
