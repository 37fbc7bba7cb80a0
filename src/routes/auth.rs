// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lichess OAuth (PKCE) authentication routes.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::{MeResponse, UserTokens};
use crate::services::jobs::Job;
use crate::services::pkce::{generate_pkce_pair, generate_state};
use crate::AppState;

/// Routes reachable without a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", get(login))
        .route("/api/auth/callback", post(callback))
}

/// Routes that need a session (auth layer applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

// ─── Login ───────────────────────────────────────────────────

/// Where to send the browser, plus the state it must bring back.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub auth_url: String,
    pub state: String,
}

/// Start the OAuth flow: new PKCE pair, verifier parked under `state`.
async fn login(State(state): State<Arc<AppState>>) -> Result<Json<LoginResponse>> {
    let pkce = generate_pkce_pair()?;
    let oauth_state = generate_state()?;

    state
        .pkce_store
        .insert(oauth_state.clone(), pkce.verifier);

    let auth_url = state.lichess.authorize_url(&oauth_state, &pkce.challenge);
    tracing::info!("Starting OAuth flow");

    Ok(Json(LoginResponse {
        auth_url,
        state: oauth_state,
    }))
}

// ─── Callback ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub code: String,
    pub state: String,
}

/// Session token issued after a successful login.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: String,
    pub username: String,
}

/// OAuth callback: redeem state, exchange code, store user, issue session.
async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<CallbackRequest>,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    let verifier = state
        .pkce_store
        .take(&body.state)
        .ok_or(AppError::InvalidOAuthState)?;

    tracing::info!("Exchanging authorization code for token");
    let token = state.lichess.exchange_code(&body.code, &verifier).await?;

    let account = state.lichess.get_account(&token.access_token).await?;
    let tokens = UserTokens {
        expires_at: token.expires_at(Utc::now()),
        access_token: token.access_token,
        refresh_token: token.refresh_token,
    };
    let user = state
        .db
        .upsert_user(&account.into_upsert(), Some(&tokens))
        .await?;

    tracing::info!(user_id = %user.id, "OAuth successful, user stored");

    // Initial import runs in the background
    if let Err(e) = state.jobs.enqueue(Job::SyncUser {
        user_id: user.id.clone(),
        max_games: state.config.sync_max_games,
    }) {
        tracing::warn!(error = %e, "Failed to queue initial game sync, continuing anyway");
    }

    let jwt = create_jwt(
        &user.id,
        &user.username,
        &state.config.jwt_signing_key,
        state.config.jwt_ttl_minutes,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(TokenResponse {
            access_token: jwt,
            token_type: "bearer".to_string(),
            user_id: user.id,
            username: user.username,
        }),
    ))
}

// ─── Session ─────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Revoke the Lichess token (best effort) and forget it locally.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>)> {
    if let Some(user) = state.db.get_user(&auth.user_id).await? {
        if let Some(token) = user.access_token.as_deref() {
            match state.lichess.revoke_token(token).await {
                Ok(true) => tracing::debug!(user_id = %user.id, "Lichess token revoked"),
                Ok(false) => tracing::warn!(user_id = %user.id, "Lichess did not confirm revoke"),
                Err(e) => tracing::warn!(user_id = %user.id, error = %e, "Token revoke failed"),
            }
        }
        state.db.clear_tokens(&user.id).await?;
    }

    tracing::info!(user_id = %auth.user_id, "User logged out");

    let removal = Cookie::build(SESSION_COOKIE).path("/").build();
    Ok((
        jar.remove(removal),
        Json(LogoutResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

/// Who the session belongs to.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;

    Ok(Json(MeResponse::from(&user)))
}
