// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Game synchronization: turn exported Lichess games into stored rows.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{Color, Game, GameResult, User};
use crate::services::lichess::{GameFetchOptions, LichessClient, RawGame};
use crate::time_utils::from_epoch_millis;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncReport {
    /// Games received from Lichess
    pub fetched: usize,
    /// Games newly stored
    pub saved: usize,
    /// Export lines that could not be parsed
    pub skipped_lines: usize,
}

/// Why an exported game was not turned into a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The user played neither side
    NotParticipant,
    /// `createdAt` is outside the representable range
    InvalidTimestamp,
}

/// Build the stored row for `user` from an exported game.
pub fn derive_game(user: &User, raw: &RawGame) -> Result<Game, DropReason> {
    let white_username = raw.players.white.username();
    let black_username = raw.players.black.username();

    let user_color = if white_username.eq_ignore_ascii_case(&user.username) {
        Color::White
    } else if black_username.eq_ignore_ascii_case(&user.username) {
        Color::Black
    } else {
        return Err(DropReason::NotParticipant);
    };

    let created_at = from_epoch_millis(raw.created_at).ok_or(DropReason::InvalidTimestamp)?;
    let speed = raw.speed.clone().unwrap_or_else(|| "unknown".to_string());

    Ok(Game {
        id: raw.id.clone(),
        user_id: user.id.clone(),
        rated: raw.rated.unwrap_or(true),
        variant: raw
            .variant
            .clone()
            .unwrap_or_else(|| "standard".to_string()),
        perf_type: raw.perf.clone().unwrap_or_else(|| speed.clone()),
        speed,
        time_control_initial: raw.clock.as_ref().and_then(|c| c.initial),
        time_control_increment: raw.clock.as_ref().and_then(|c| c.increment),
        white_username: white_username.to_string(),
        white_rating: raw.players.white.rating,
        white_rating_diff: raw.players.white.rating_diff,
        black_username: black_username.to_string(),
        black_rating: raw.players.black.rating,
        black_rating_diff: raw.players.black.rating_diff,
        user_color,
        result: GameResult::from_winner(user_color, raw.winner),
        status: raw.status.clone().unwrap_or_else(|| "unknown".to_string()),
        winner: raw.winner,
        created_at,
        last_move_at: raw.last_move_at.and_then(from_epoch_millis),
        opening_eco: raw.opening.as_ref().and_then(|o| o.eco.clone()),
        opening_name: raw.opening.as_ref().and_then(|o| o.name.clone()),
    })
}

/// Store the games from `raws` that belong to `user` and are new.
///
/// Everything is written in one transaction; returns the number inserted.
pub async fn save_games(db: &Database, user: &User, raws: &[RawGame]) -> Result<usize, AppError> {
    let mut games = Vec::with_capacity(raws.len());
    let mut not_participant = 0usize;
    let mut bad_timestamp = 0usize;

    for raw in raws {
        match derive_game(user, raw) {
            Ok(game) => games.push(game),
            Err(DropReason::NotParticipant) => not_participant += 1,
            Err(DropReason::InvalidTimestamp) => {
                tracing::warn!(
                    user_id = %user.id,
                    game_id = %raw.id,
                    created_at = raw.created_at,
                    "Dropped game with out-of-range timestamp"
                );
                bad_timestamp += 1;
            }
        }
    }

    if not_participant > 0 {
        tracing::debug!(
            user_id = %user.id,
            dropped = not_participant,
            "Dropped games the user did not play"
        );
    }
    if bad_timestamp > 0 {
        tracing::warn!(
            user_id = %user.id,
            dropped = bad_timestamp,
            "Dropped games with invalid timestamps"
        );
    }

    db.insert_new_games(&user.id, &games).await
}

/// Fetch the user's games from Lichess and store the new ones.
pub async fn sync_user_games(
    db: &Database,
    lichess: &LichessClient,
    user: &User,
    options: &GameFetchOptions,
) -> Result<SyncReport, AppError> {
    let access_token = user
        .access_token
        .as_deref()
        .ok_or(AppError::MissingLichessToken)?;

    let fetched = lichess
        .get_user_games(Some(access_token), &user.username, options)
        .await?;
    let saved = save_games(db, user, &fetched.games).await?;

    let report = SyncReport {
        fetched: fetched.games.len(),
        saved,
        skipped_lines: fetched.skipped_lines,
    };

    tracing::info!(
        user_id = %user.id,
        fetched = report.fetched,
        saved = report.saved,
        skipped = report.skipped_lines,
        "Game sync complete"
    );
    Ok(report)
}
