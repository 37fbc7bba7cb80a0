// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task handler routes for externally scheduled sync jobs.
//!
//! These endpoints are called by a scheduler, not directly by users, and
//! are guarded by the shared `x-tasks-token` secret (see routes/mod.rs).

use crate::error::Result;
use crate::services::jobs::{
    run_sync_all, run_sync_user, SyncAllPayload, SyncJobResult, SyncUserPayload,
    DEFAULT_USER_SYNC_MAX_GAMES,
};
use crate::services::lichess::MAX_GAMES_PER_REQUEST;
use crate::AppState;
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use std::sync::Arc;

/// Task handler routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks/sync-user", post(sync_user))
        .route("/tasks/sync-all", post(sync_all))
}

fn clamp_max_games(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, MAX_GAMES_PER_REQUEST)
}

/// Sync one user's games.
async fn sync_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SyncUserPayload>,
) -> Json<SyncJobResult> {
    let max_games = clamp_max_games(payload.max_games, DEFAULT_USER_SYNC_MAX_GAMES);
    tracing::info!(user_id = %payload.user_id, max_games, "Running sync-user task");

    Json(run_sync_user(&state.db, &state.lichess, &payload.user_id, max_games).await)
}

/// Sync every user that has a stored token.
async fn sync_all(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SyncAllPayload>,
) -> Result<Json<Vec<SyncJobResult>>> {
    let max_games = clamp_max_games(payload.max_games, state.config.sync_max_games);
    tracing::info!(max_games, "Running sync-all task");

    Ok(Json(run_sync_all(&state.db, &state.lichess, max_games).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_max_games() {
        assert_eq!(clamp_max_games(None, 100), 100);
        assert_eq!(clamp_max_games(Some(0), 100), 1);
        assert_eq!(clamp_max_games(Some(1000), 100), 300);
        assert_eq!(clamp_max_games(Some(25), 100), 25);
    }
}
