// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error type shared by providers, storage adapters and the auth service.
///
/// Messages never include client secrets or raw tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("provider not found")]
    ProviderNotFound(String),

    #[error("invalid state")]
    InvalidState,

    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("missing authorization code")]
    MissingCode,

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("profile extraction failed: {0}")]
    ProfileExtractionFailed(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("user not found")]
    UserNotFound,

    #[error("session not found")]
    SessionNotFound,

    #[error("session not created")]
    SessionNotCreated,

    #[error("invalid session")]
    InvalidSession,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// HTTP status for this error at the transport boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ProviderNotFound(_) | AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidState
            | AuthError::AuthorizationDenied(_)
            | AuthError::MissingCode => StatusCode::BAD_REQUEST,
            AuthError::InvalidSession | AuthError::SessionNotFound => StatusCode::UNAUTHORIZED,
            AuthError::TokenExchangeFailed(_) | AuthError::ProfileExtractionFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            AuthError::Storage(_) | AuthError::SessionNotCreated | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Storage(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error = match &self {
            AuthError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage failure");
                "storage failure".to_string()
            }
            AuthError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "internal error".to_string()
            }
            AuthError::SessionNotFound => "invalid session".to_string(),
            AuthError::TokenExchangeFailed(_) | AuthError::ProfileExtractionFailed(_) => {
                tracing::warn!(error = %self, "Upstream identity provider failure");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, AuthError>;
