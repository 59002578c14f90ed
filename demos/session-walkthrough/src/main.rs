use std::sync::{Arc, Mutex};

use feedline::prelude::*;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

const API: &str = "http://localhost:3000/api";

#[derive(Deserialize)]
struct LoginBody {
    identificator: String,
    password: String,
}

/// A stand-in for the real backend: one user, one session cookie.
#[derive(Default)]
struct Backend {
    logged_in: Mutex<bool>,
}

impl Backend {
    fn is_logged_in(&self) -> bool {
        self.logged_in.lock().map(|l| *l).unwrap_or(false)
    }

    fn set_logged_in(&self, value: bool) {
        if let Ok(mut l) = self.logged_in.lock() {
            *l = value;
        }
    }

    /// The server forgets the session, as if it had expired on its side.
    fn expire_cookie(&self) {
        self.set_logged_in(false);
    }

    fn user() -> serde_json::Value {
        serde_json::json!({
            "_id": "1",
            "email": "ana@example.com",
            "userName": "ana",
            "name": "Ana",
            "profile": "usuario",
            "active": true
        })
    }

    fn respond(&self, request: &HttpRequest) -> (StatusCode, serde_json::Value) {
        let unauthorized = (
            StatusCode::UNAUTHORIZED,
            serde_json::json!({ "message": "No autorizado" }),
        );
        match request.path() {
            "/api/auth/login" => {
                let body: Option<LoginBody> = request
                    .body
                    .as_deref()
                    .and_then(|b| serde_json::from_slice(b).ok());
                match body {
                    Some(b) if b.identificator == "ana" && b.password == "Secret123" => {
                        self.set_logged_in(true);
                        (
                            StatusCode::OK,
                            serde_json::json!({
                                "success": true,
                                "message": "Login exitoso",
                                "data": { "user": Self::user() }
                            }),
                        )
                    }
                    _ => (
                        StatusCode::UNAUTHORIZED,
                        serde_json::json!({ "message": "Credenciales incorrectas" }),
                    ),
                }
            }
            "/api/auth/autorizar" if self.is_logged_in() => (
                StatusCode::OK,
                serde_json::json!({
                    "success": true,
                    "data": { "user": Self::user(), "valid": true }
                }),
            ),
            "/api/auth/refrescar" if self.is_logged_in() => {
                (StatusCode::OK, serde_json::json!({ "success": true }))
            }
            "/api/auth/logout" => {
                self.set_logged_in(false);
                (StatusCode::OK, serde_json::json!({ "success": true }))
            }
            "/api/publicaciones" if self.is_logged_in() => (
                StatusCode::OK,
                serde_json::json!([{ "_id": "p1", "titulo": "Hola" }]),
            ),
            _ => unauthorized,
        }
    }
}

impl HttpTransport for Backend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let (status, body) = self.respond(&request);
        let body = serde_json::to_vec(&body)
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;
        HttpResponse::new(status, body).into_result()
    }
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

const CONFIG: &str = r#"
api_base_url = "http://localhost:3000/api/auth"

[session]
warning_after_secs = 3
expire_after_secs = 6
refresh_timeout_secs = 2

[navigation]
authenticated_landing = { redirect_to = "/publicaciones" }
"#;

type Client = FeedlineClient<Arc<Backend>, Arc<History>>;

fn build(backend: &Arc<Backend>, history: &Arc<History>) -> Result<Client, FeedlineError> {
    let config = ClientConfig::from_toml_str(CONFIG)?;
    FeedlineClientBuilder::new()
        .config(config)
        .build(Arc::clone(backend), Arc::clone(history))
}

/// Waits until the warning opens and returns the first prompt.
async fn next_warning(presenter: &mut WarningPresenter) -> Result<WarningPrompt, FeedlineError> {
    loop {
        if let Some(prompt) = presenter.changed().await? {
            return Ok(prompt);
        }
    }
}

async fn walkthrough(client: &Client, backend: &Backend) -> Result<(), FeedlineError> {
    let mut presenter = client.presenter();

    let resumed = client.bootstrap().await?;
    eprintln!("startup: resumed session = {}", resumed.is_some());

    let decision = client.navigate(&Route::feed()).await;
    eprintln!("open /publicaciones while logged out: {decision:?}");

    if let Err(e) = client.login(&LoginCredentials::new("ana", "wrong")).await {
        eprintln!("login with a bad password: {e}");
    }

    let user = client.login(&LoginCredentials::new("ana", "Secret123")).await?;
    eprintln!(
        "logged in as {} -> now at {:?}",
        user.user_name,
        client.navigator().current()
    );

    let prompt = next_warning(&mut presenter).await?;
    eprintln!("{prompt}");
    let extended = presenter.extend().await?;
    eprintln!("extend: {extended}, state = {}", client.lifecycle().state());

    let feed = client
        .http()
        .send(HttpRequest::get(format!("{API}/publicaciones")))
        .await?;
    eprintln!("GET /publicaciones -> {}", feed.status);

    backend.expire_cookie();
    if let Err(e) = client
        .http()
        .send(HttpRequest::get(format!("{API}/publicaciones")))
        .await
    {
        eprintln!(
            "server-side expiry: {e}; session live = {}, now at {:?}",
            client.authority().is_live(),
            client.navigator().current()
        );
    }

    client.login(&LoginCredentials::new("ana", "Secret123")).await?;
    let prompt = next_warning(&mut presenter).await?;
    eprintln!("{prompt}, letting it run out");
    while client.lifecycle().state() != LifecycleState::Idle {
        presenter.changed().await?;
    }
    eprintln!("expired: session live = {}", client.authority().is_live());

    client.login(&LoginCredentials::new("ana", "Secret123")).await?;
    client.logout().await?;
    eprintln!("logged out -> now at {:?}", client.navigator().current());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    feedline::telemetry::init_with_default("info,feedline_lifecycle=debug");

    let backend = Arc::new(Backend::default());
    let history = Arc::new(History::new());
    let client = build(&backend, &history)?;

    walkthrough(&client, &backend).await?;
    client.shutdown().await?;
    Ok(())
}
