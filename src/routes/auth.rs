// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, callback, session and logout routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::{require_session, CurrentUser};
use crate::models::{ProviderDescriptor, SessionCookie, User, SESSION_COOKIE_NAME};
use crate::services::CallbackParams;
use crate::AppState;

/// Routes reachable without a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/providers", get(list_providers))
        .route("/auth/login/{provider}", get(login))
        .route("/auth/callback/{provider}", get(callback))
        .route("/auth/logout", post(logout))
}

/// Routes that require a valid session cookie.
pub fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", get(current_session))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

#[derive(Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderDescriptor>,
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.auth.list_providers(),
    })
}

/// Start the flow: 307 to the provider's authorization endpoint.
async fn login(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Redirect> {
    let url = state.auth.login(&provider)?;
    Ok(Redirect::temporary(&url))
}

/// Provider callback: verify, upsert the user, set the session cookie.
async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<User>)> {
    let outcome = state.auth.callback(&provider, &params).await?;
    Ok((jar.add(outcome.cookie.to_cookie()), Json(outcome.user)))
}

/// Return the user owning the session cookie.
async fn current_session(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}

/// End the session named by the cookie (if any) and clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state.auth.logout(cookie.value()).await?;
    }
    Ok((jar.add(SessionCookie::removal()), StatusCode::NO_CONTENT))
}
