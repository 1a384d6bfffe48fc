// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::error::AuthError;
use crate::models::{User, SESSION_COOKIE_NAME};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// User resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Middleware that requires a valid `session` cookie.
///
/// On success the owning user is stored as a [`CurrentUser`] request
/// extension. Missing, unknown and expired sessions all get the same 401.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string()) else {
        return AuthError::InvalidSession.into_response();
    };

    match state.auth.session(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(e) => {
            if !matches!(e, AuthError::InvalidSession) {
                tracing::error!(error = %e, "Session lookup failed");
            }
            e.into_response()
        }
    }
}
