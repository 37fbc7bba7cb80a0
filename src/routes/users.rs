// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::UserResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/{username}", get(get_public_profile))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/me", get(get_my_profile))
        .route("/api/users/me/refresh", post(refresh_my_profile))
}

/// Full profile of the logged-in user.
async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;

    Ok(Json(user.into()))
}

/// Re-fetch the account from Lichess and store the new ratings/profile.
async fn refresh_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;
    let token = user
        .access_token
        .as_deref()
        .ok_or(AppError::MissingLichessToken)?;

    let account = state.lichess.get_account(token).await?;
    let updated = state.db.upsert_user(&account.into_upsert(), None).await?;

    tracing::info!(user_id = %updated.id, "Profile refreshed from Lichess");
    Ok(Json(updated.into()))
}

/// Any user's public profile: local copy first, then Lichess.
async fn get_public_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>> {
    if let Some(user) = state.db.get_user_by_username(&username).await? {
        return Ok(Json(user.into()));
    }

    match state.lichess.get_user_public(&username).await? {
        Some(account) => Ok(Json(account.into_upsert().into())),
        None => Err(AppError::NotFound(format!("User {} not found", username))),
    }
}
