// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test harness: an in-process identity provider and app builders.

use authbridge::config::Config;
use authbridge::db::{MemoryAdapter, SqliteAdapter, StorageAdapter};
use authbridge::routes::create_router;
use authbridge::services::{
    google_config, AuthService, OAuthProvider, OAuthProviderConfig, Provider, StateTokenSigner,
};
use authbridge::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_KID: &str = "test-key-1";
pub const TEST_PRIVATE_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_rsa_private.pem");
pub const TEST_JWKS_JSON: &str = include_str!("../fixtures/test_jwks.json");

/// Authorization codes with special meaning to the stub token endpoint.
#[allow(dead_code)]
pub mod codes {
    /// Token endpoint answers 400 `invalid_grant`
    pub const REJECTED: &str = "rejected-code";
    /// Token response without an ID token
    pub const NO_ID_TOKEN: &str = "no-id-token";
    /// ID token with `alg: none` and no signature
    pub const UNSIGNED: &str = "unsigned-id-token";
    /// ID token signed by a key the IdP does not publish
    pub const WRONG_KID: &str = "wrong-kid";
}

/// State of the stub IdP, shared with its handlers.
pub struct IdpState {
    pub issuer: String,
    /// Claims placed in issued ID tokens (`iss`, `aud`, `exp`, `iat` are added)
    pub claims: Mutex<Value>,
    pub token_requests: AtomicUsize,
    pub jwks_requests: AtomicUsize,
    pub last_token_form: Mutex<HashMap<String, String>>,
}

/// In-process OpenID Connect provider on `127.0.0.1`.
pub struct StubIdp {
    pub base_url: String,
    pub state: Arc<IdpState>,
}

#[allow(dead_code)]
impl StubIdp {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub IdP");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(IdpState {
            issuer: base_url.clone(),
            claims: Mutex::new(json!({
                "sub": "abc123",
                "email": "a@b.com",
                "name": "A B",
            })),
            token_requests: AtomicUsize::new(0),
            jwks_requests: AtomicUsize::new(0),
            last_token_form: Mutex::new(HashMap::new()),
        });

        let app = Router::new()
            .route("/token", post(token_endpoint))
            .route("/.well-known/openid-configuration", get(discovery))
            .route("/jwks", get(jwks))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub IdP server");
        });

        Self { base_url, state }
    }

    pub fn set_claims(&self, claims: Value) {
        *self.state.claims.lock().unwrap() = claims;
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub fn jwks_requests(&self) -> usize {
        self.state.jwks_requests.load(Ordering::SeqCst)
    }

    pub fn last_token_form(&self) -> HashMap<String, String> {
        self.state.last_token_form.lock().unwrap().clone()
    }

    /// Google preset pointed at this stub.
    pub fn provider_config(&self, allow_email_linking: bool) -> OAuthProviderConfig {
        let config = Config::test_default();
        let mut provider = google_config(
            config.google_client_id.unwrap(),
            config.google_client_secret.unwrap(),
            allow_email_linking,
        );
        provider.authorization_endpoint = format!("{}/authorize", self.base_url);
        provider.token_endpoint = format!("{}/token", self.base_url);
        provider.discovery_url = format!("{}/.well-known/openid-configuration", self.base_url);
        provider.jwks_uri = None;
        provider.accepted_issuers = vec![self.base_url.clone()];
        provider
    }
}

async fn token_endpoint(
    State(state): State<Arc<IdpState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    *state.last_token_form.lock().unwrap() = form.clone();

    let code = form.get("code").cloned().unwrap_or_default();
    if code == codes::REJECTED {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "code test_client_secret expired",
            })),
        )
            .into_response();
    }

    let mut body = json!({
        "access_token": "stub-access-token",
        "token_type": "Bearer",
        "expires_in": 3600,
        "scope": "openid profile email",
        "refresh_token": "stub-refresh-token",
    });

    let claims = id_token_claims(&state);
    let id_token = match code.as_str() {
        codes::NO_ID_TOKEN => None,
        codes::UNSIGNED => Some(unsigned_id_token(&claims)),
        codes::WRONG_KID => Some(sign_id_token_with_kid(&claims, "unpublished-key")),
        _ => Some(sign_id_token(&claims)),
    };
    if let Some(id_token) = id_token {
        body["id_token"] = Value::String(id_token);
    }

    Json(body).into_response()
}

async fn discovery(State(state): State<Arc<IdpState>>) -> Json<Value> {
    Json(json!({
        "issuer": state.issuer,
        "jwks_uri": format!("{}/jwks", state.issuer),
    }))
}

async fn jwks(State(state): State<Arc<IdpState>>) -> Response {
    state.jwks_requests.fetch_add(1, Ordering::SeqCst);
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        TEST_JWKS_JSON,
    )
        .into_response()
}

fn id_token_claims(state: &IdpState) -> Value {
    let now = chrono::Utc::now().timestamp();
    let mut claims = state.claims.lock().unwrap().clone();
    let defaults = json!({
        "iss": state.issuer,
        "aud": "test_client_id",
        "iat": now,
        "exp": now + 600,
    });
    if let (Some(claims), Some(defaults)) = (claims.as_object_mut(), defaults.as_object()) {
        for (k, v) in defaults {
            claims.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
    claims
}

/// Sign claims with the fixture key under [`TEST_KID`].
#[allow(dead_code)]
pub fn sign_id_token(claims: &Value) -> String {
    sign_id_token_with_kid(claims, TEST_KID)
}

#[allow(dead_code)]
pub fn sign_id_token_with_kid(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY_PEM).expect("fixture private key");
    jsonwebtoken::encode(&header, claims, &key).expect("sign ID token")
}

/// A JWT with `alg: none` and an empty signature.
#[allow(dead_code)]
pub fn unsigned_id_token(claims: &Value) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.")
}

/// Test app with one Google provider backed by `idp` and the given storage.
#[allow(dead_code)]
pub fn create_test_app_with(
    idp: &StubIdp,
    storage: Arc<dyn StorageAdapter>,
    allow_email_linking: bool,
) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let state_tokens = Arc::new(
        StateTokenSigner::new(&config.auth_secret, config.state_max_age)
            .expect("state token signer"),
    );
    let provider = OAuthProvider::new(
        idp.provider_config(allow_email_linking),
        state_tokens,
        config.http_timeout,
    )
    .expect("provider");

    let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(provider)];
    let auth = AuthService::new(providers, storage, config.public_url.clone());

    let state = Arc::new(AppState { config, auth });
    (create_router(state.clone()), state)
}

/// Test app with in-memory storage.
#[allow(dead_code)]
pub fn create_test_app(idp: &StubIdp) -> (axum::Router, Arc<AppState>, Arc<MemoryAdapter>) {
    let storage = Arc::new(MemoryAdapter::new(Config::test_default().session_ttl));
    let (app, state) = create_test_app_with(idp, storage.clone(), false);
    (app, state, storage)
}

/// Fresh SQLite adapter on a private in-memory database.
#[allow(dead_code)]
pub async fn sqlite_adapter() -> SqliteAdapter {
    let adapter = SqliteAdapter::connect("sqlite::memory:", Config::test_default().session_ttl)
        .await
        .expect("open in-memory SQLite");
    adapter.migrate().await.expect("migrate");
    adapter
}

/// SQLite adapter on a database file, so writers use separate connections.
///
/// The database lives as long as the returned directory.
#[allow(dead_code)]
pub async fn sqlite_file_adapter() -> (tempfile::TempDir, SqliteAdapter) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let url = format!("sqlite://{}", dir.path().join("auth.db").display());
    let adapter = SqliteAdapter::connect(&url, Config::test_default().session_ttl)
        .await
        .expect("open SQLite file");
    adapter.migrate().await.expect("migrate");
    (dir, adapter)
}

/// Extract the decoded `state` parameter from an authorization URL.
#[allow(dead_code)]
pub fn state_from_url(url: &str) -> String {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("state="))
        .map(|v| urlencoding::decode(v).expect("utf-8 state").into_owned())
        .unwrap_or_else(|| panic!("no state in {url}"))
}

/// Callback URI for the router carrying `code` and `state`.
#[allow(dead_code)]
pub fn callback_uri(provider: &str, code: &str, state: &str) -> String {
    format!(
        "/auth/callback/{}?code={}&state={}",
        provider,
        urlencoding::encode(code),
        urlencoding::encode(state)
    )
}
