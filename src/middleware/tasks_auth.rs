// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret authentication for internal task endpoints.

use crate::config::TASKS_TOKEN_HEADER;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Require a matching `x-tasks-token` header for `/tasks/*` routes.
///
/// With no token configured the endpoints are disabled entirely.
pub async fn require_tasks_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.tasks_token.as_deref() else {
        tracing::warn!("Blocked tasks request: TASKS_TOKEN not configured");
        return Err(StatusCode::FORBIDDEN);
    };

    let provided = request
        .headers()
        .get(TASKS_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let matches: bool = provided.as_bytes().ct_eq(expected.as_bytes()).into();
    if !matches {
        tracing::warn!(
            header_present = !provided.is_empty(),
            "Blocked tasks request with invalid token"
        );
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}
