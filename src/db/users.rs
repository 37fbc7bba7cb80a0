// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User queries.

use super::Database;
use crate::error::AppError;
use crate::models::{User, UserTokens, UserUpsert};
use chrono::Utc;
use sqlx::types::Json;

impl Database {
    /// Insert or update a user keyed by the lowercase username.
    ///
    /// `created_at` and `last_games_sync` survive updates. Stored tokens are
    /// only replaced when new ones are supplied.
    pub async fn upsert_user(
        &self,
        user: &UserUpsert,
        tokens: Option<&UserTokens>,
    ) -> Result<User, AppError> {
        let id = user.id();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO users (
                id, lichess_id, username, title, patron, created_at_lichess, seen_at,
                play_time_total, play_time_tv, ratings, profile,
                access_token, refresh_token, token_expires_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                lichess_id = excluded.lichess_id,
                username = excluded.username,
                title = excluded.title,
                patron = excluded.patron,
                created_at_lichess = excluded.created_at_lichess,
                seen_at = excluded.seen_at,
                play_time_total = excluded.play_time_total,
                play_time_tv = excluded.play_time_tv,
                ratings = excluded.ratings,
                profile = excluded.profile,
                access_token = COALESCE(excluded.access_token, users.access_token),
                refresh_token = CASE WHEN excluded.access_token IS NULL
                    THEN users.refresh_token ELSE excluded.refresh_token END,
                token_expires_at = CASE WHEN excluded.access_token IS NULL
                    THEN users.token_expires_at ELSE excluded.token_expires_at END,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&id)
        .bind(&user.lichess_id)
        .bind(&user.username)
        .bind(&user.title)
        .bind(user.patron)
        .bind(user.created_at_lichess)
        .bind(user.seen_at)
        .bind(user.play_time_total)
        .bind(user.play_time_tv)
        .bind(Json(&user.ratings))
        .bind(Json(&user.profile))
        .bind(tokens.map(|t| t.access_token.as_str()))
        .bind(tokens.and_then(|t| t.refresh_token.as_deref()))
        .bind(tokens.and_then(|t| t.expires_at))
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        tracing::debug!(user_id = %id, with_tokens = tokens.is_some(), "Upserted user");

        self.get_user(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
    }

    /// Get a user by local id.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    /// Case-insensitive lookup by Lichess username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.get_user(&username.to_lowercase()).await
    }

    /// Forget stored OAuth tokens (logout).
    pub async fn clear_tokens(&self, id: &str) -> Result<(), AppError> {
        sqlx::query(
            r"
            UPDATE users
            SET access_token = NULL, refresh_token = NULL, token_expires_at = NULL, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?;

        tracing::debug!(user_id = %id, "Cleared stored tokens");
        Ok(())
    }

    /// All users that can be synced in the background.
    pub async fn list_users_with_tokens(&self) -> Result<Vec<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE access_token IS NOT NULL ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?)
    }

    /// Delete a user and, through the foreign key, all of their games.
    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        tracing::info!(user_id = %id, deleted, "User deletion complete");
        Ok(deleted)
    }
}
