// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Game queries: batch insert, filtered listing, aggregates.

use super::Database;
use crate::error::AppError;
use crate::models::{Game, GameFilters, GameResult, GameStats, ResultCounts};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::BTreeMap;

/// One page of a filtered game listing. `page` is 1-indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct GameQuery {
    pub page: u32,
    pub page_size: u32,
    pub filters: GameFilters,
}

impl GameQuery {
    fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// Append `WHERE` clauses for `user_id` and the optional filters.
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, user_id: &str, filters: &GameFilters) {
    builder.push(" WHERE user_id = ").push_bind(user_id.to_string());

    if let Some(perf_type) = &filters.perf_type {
        builder.push(" AND perf_type = ").push_bind(perf_type.clone());
    }
    if let Some(result) = filters.result {
        builder.push(" AND result = ").push_bind(result);
    }
    if let Some(rated) = filters.rated {
        builder.push(" AND rated = ").push_bind(rated);
    }
    if let Some(since) = filters.since {
        builder.push(" AND created_at >= ").push_bind(since);
    }
    if let Some(until) = filters.until {
        builder.push(" AND created_at <= ").push_bind(until);
    }
}

impl Database {
    /// Insert games that are not stored yet and bump the owner's
    /// `last_games_sync`, all in one transaction.
    ///
    /// Returns how many rows were inserted. Ids already present (for any
    /// user) are skipped. Nothing is written when no row is new.
    pub async fn insert_new_games(&self, user_id: &str, games: &[Game]) -> Result<usize, AppError> {
        let mut tx = self.pool().begin().await?;
        let mut saved = 0usize;

        for game in games {
            let result = sqlx::query(
                r"
                INSERT INTO games (
                    id, user_id, rated, variant, speed, perf_type,
                    time_control_initial, time_control_increment,
                    white_username, white_rating, white_rating_diff,
                    black_username, black_rating, black_rating_diff,
                    user_color, result, status, winner,
                    created_at, last_move_at, opening_eco, opening_name
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                ",
            )
            .bind(&game.id)
            .bind(user_id)
            .bind(game.rated)
            .bind(&game.variant)
            .bind(&game.speed)
            .bind(&game.perf_type)
            .bind(game.time_control_initial)
            .bind(game.time_control_increment)
            .bind(&game.white_username)
            .bind(game.white_rating)
            .bind(game.white_rating_diff)
            .bind(&game.black_username)
            .bind(game.black_rating)
            .bind(game.black_rating_diff)
            .bind(game.user_color)
            .bind(game.result)
            .bind(&game.status)
            .bind(game.winner)
            .bind(game.created_at)
            .bind(game.last_move_at)
            .bind(&game.opening_eco)
            .bind(&game.opening_name)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                saved += 1;
            }
        }

        if saved == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        sqlx::query("UPDATE users SET last_games_sync = ?, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(Utc::now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(user_id = %user_id, saved, offered = games.len(), "Inserted games");
        Ok(saved)
    }

    /// One page of a user's games (newest first) plus the unpaginated count.
    pub async fn list_games(
        &self,
        user_id: &str,
        query: &GameQuery,
    ) -> Result<(Vec<Game>, i64), AppError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM games");
        push_filters(&mut count, user_id, &query.filters);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM games");
        push_filters(&mut select, user_id, &query.filters);
        select
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(query.page_size))
            .push(" OFFSET ")
            .push_bind(query.offset());
        let games = select.build_query_as::<Game>().fetch_all(self.pool()).await?;

        Ok((games, total))
    }

    /// A single game, only if owned by `user_id`.
    pub async fn get_game(&self, user_id: &str, game_id: &str) -> Result<Option<Game>, AppError> {
        Ok(
            sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = ? AND user_id = ?")
                .bind(game_id)
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    /// Counts by result and by perf type.
    pub async fn game_stats(&self, user_id: &str) -> Result<GameStats, AppError> {
        let by_result: Vec<(GameResult, i64)> = sqlx::query_as(
            "SELECT result, COUNT(*) FROM games WHERE user_id = ? GROUP BY result",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        let by_type: Vec<(String, i64)> = sqlx::query_as(
            "SELECT perf_type, COUNT(*) FROM games WHERE user_id = ? GROUP BY perf_type",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        let mut results = ResultCounts::default();
        for (result, count) in by_result {
            results.add(result, count);
        }
        let by_type: BTreeMap<String, i64> = by_type.into_iter().collect();
        let total = results.win + results.loss + results.draw;

        Ok(GameStats::new(total, results, by_type))
    }
}
