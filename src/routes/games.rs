// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Game listing, lookup, sync and stats routes (require authentication).

use crate::db::GameQuery;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::game::has_more;
use crate::models::{GameFilters, GameListResponse, GameResponse, GameResult, GameStats};
use crate::services::lichess::{GameFetchOptions, MAX_GAMES_PER_REQUEST};
use crate::services::sync::sync_user_games;
use crate::time_utils::parse_rfc3339_param;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/games/me", get(list_my_games))
        .route("/api/games/me/sync", post(sync_my_games))
        .route("/api/games/me/{game_id}", get(get_my_game))
        .route("/api/games/stats/me", get(get_my_stats))
}

fn validation_error(err: validator::ValidationErrors) -> AppError {
    AppError::BadRequest(err.to_string())
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct GamesQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    page: u32,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100))]
    page_size: u32,
    perf_type: Option<String>,
    result: Option<GameResult>,
    rated: Option<bool>,
    /// RFC3339
    since: Option<String>,
    /// RFC3339
    until: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

impl GamesQuery {
    fn into_game_query(self) -> Result<GameQuery> {
        self.validate().map_err(validation_error)?;

        Ok(GameQuery {
            page: self.page,
            page_size: self.page_size.min(MAX_PAGE_SIZE),
            filters: GameFilters {
                since: parse_rfc3339_param("since", self.since.as_deref())?,
                until: parse_rfc3339_param("until", self.until.as_deref())?,
                perf_type: self.perf_type.filter(|p| !p.is_empty()),
                result: self.result,
                rated: self.rated,
            },
        })
    }
}

/// Paginated, filtered list of the user's games, newest first.
async fn list_my_games(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<GamesQuery>,
) -> Result<Json<GameListResponse>> {
    let query = params.into_game_query()?;
    let (games, total) = state.db.list_games(&auth.user_id, &query).await?;

    let base_url = state.lichess.base_url();
    Ok(Json(GameListResponse {
        games: games
            .into_iter()
            .map(|g| GameResponse::new(g, base_url))
            .collect(),
        total,
        page: query.page,
        page_size: query.page_size,
        has_more: has_more(query.page, query.page_size, total),
    }))
}

/// One of the user's games.
async fn get_my_game(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(game_id): Path<String>,
) -> Result<Json<GameResponse>> {
    let game = state
        .db
        .get_game(&auth.user_id, &game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

    Ok(Json(GameResponse::new(game, state.lichess.base_url())))
}

// ─── Sync ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct SyncQuery {
    #[serde(default = "default_sync_max_games")]
    #[validate(range(min = 1, max = 300))]
    max_games: u32,
    perf_type: Option<String>,
}

fn default_sync_max_games() -> u32 {
    50
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncResponse {
    pub message: String,
    pub fetched: usize,
    pub saved: usize,
    /// Export lines that could not be parsed
    pub skipped: usize,
}

/// Pull recent games from Lichess now.
async fn sync_my_games(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<SyncQuery>,
) -> Result<Json<SyncResponse>> {
    params.validate().map_err(validation_error)?;

    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;

    let options = GameFetchOptions {
        max_games: params.max_games.min(MAX_GAMES_PER_REQUEST),
        perf_type: params.perf_type.filter(|p| !p.is_empty()),
        ..Default::default()
    };
    let report = sync_user_games(&state.db, &state.lichess, &user, &options).await?;

    Ok(Json(SyncResponse {
        message: format!("Successfully synced {} new games", report.saved),
        fetched: report.fetched,
        saved: report.saved,
        skipped: report.skipped_lines,
    }))
}

// ─── Stats ───────────────────────────────────────────────────

/// Counts by result and perf type, plus win rate.
async fn get_my_stats(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<GameStats>> {
    Ok(Json(state.db.game_stats(&auth.user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: u32, page_size: u32) -> GamesQuery {
        GamesQuery {
            page,
            page_size,
            perf_type: None,
            result: None,
            rated: None,
            since: None,
            until: None,
        }
    }

    #[test]
    fn test_games_query_bounds() {
        assert!(query(1, 20).into_game_query().is_ok());
        assert!(query(0, 20).into_game_query().is_err());
        assert!(query(1, 0).into_game_query().is_err());
        assert!(query(1, 101).into_game_query().is_err());
        assert!(query(1, 100).into_game_query().is_ok());
    }

    #[test]
    fn test_games_query_rejects_bad_dates() {
        let mut q = query(1, 20);
        q.since = Some("last tuesday".to_string());
        assert!(matches!(
            q.into_game_query(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_sync_query_bounds() {
        let ok = SyncQuery {
            max_games: 300,
            perf_type: None,
        };
        let too_many = SyncQuery {
            max_games: 301,
            perf_type: None,
        };
        assert!(ok.validate().is_ok());
        assert!(too_many.validate().is_err());
    }
}
