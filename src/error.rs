// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid or expired state. Please try logging in again.")]
    InvalidOAuthState,

    #[error("No Lichess token available. Please log in again.")]
    MissingLichessToken,

    #[error("Lichess API error: {0}")]
    LichessApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message used when Lichess rejects our bearer token.
    pub const LICHESS_TOKEN_ERROR: &'static str = "Lichess token rejected";
    /// Message used when Lichess answers 429.
    pub const LICHESS_RATE_LIMIT: &'static str = "Lichess rate limit exceeded";

    /// True when the error means the stored Lichess token is no longer usable.
    pub fn is_lichess_token_error(&self) -> bool {
        match self {
            AppError::LichessApi(msg) => msg == Self::LICHESS_TOKEN_ERROR,
            AppError::MissingLichessToken => true,
            _ => false,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::InvalidOAuthState => (
                StatusCode::BAD_REQUEST,
                "invalid_oauth_state",
                Some(self.to_string()),
            ),
            AppError::MissingLichessToken => (
                StatusCode::BAD_REQUEST,
                "missing_lichess_token",
                Some(self.to_string()),
            ),
            AppError::LichessApi(msg) => {
                (StatusCode::BAD_GATEWAY, "lichess_error", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
