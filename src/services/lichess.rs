// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lichess API client.
//!
//! Handles:
//! - Account and public profile lookups
//! - Streaming a user's game export (NDJSON)
//! - OAuth code exchange and token revocation

use crate::config::Config;
use crate::error::AppError;
use crate::models::user::ratings_from_perfs;
use crate::models::{Color, Profile, UserUpsert};
use crate::time_utils::{from_epoch_millis, to_epoch_millis};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::StreamExt;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Most games Lichess will export in one request.
pub const MAX_GAMES_PER_REQUEST: u32 = 300;

/// OAuth scope requested at login.
pub const OAUTH_SCOPE: &str = "preference:read";

const API_TIMEOUT: Duration = Duration::from_secs(30);
const GAME_STREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Lichess API client.
#[derive(Clone)]
pub struct LichessClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    redirect_uri: String,
}

impl LichessClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.lichess_base_url.trim_end_matches('/').to_string(),
            client_id: config.lichess_client_id.clone(),
            redirect_uri: config.lichess_redirect_uri.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authorization URL the browser is sent to.
    pub fn authorize_url(&self, state: &str, code_challenge: &str) -> String {
        format!(
            "{}/oauth?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge_method=S256&code_challenge={}",
            self.base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(OAUTH_SCOPE),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge),
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// A rejected exchange is the caller's problem (bad or reused code),
    /// so it is reported as a bad request.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/api/token", self.base_url))
            .timeout(API_TIMEOUT)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("code_verifier", code_verifier),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::LichessApi(format!("Token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Lichess token exchange rejected");
            return Err(AppError::BadRequest(format!(
                "Failed to exchange code for token: HTTP {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::LichessApi(format!("Invalid token response: {}", e)))
    }

    /// Revoke an access token. Returns whether Lichess confirmed it.
    pub async fn revoke_token(&self, access_token: &str) -> Result<bool, AppError> {
        let response = self
            .http
            .delete(format!("{}/api/token", self.base_url))
            .timeout(API_TIMEOUT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::LichessApi(format!("Token revoke request failed: {}", e)))?;

        Ok(response.status() == StatusCode::NO_CONTENT)
    }

    /// Account of the token owner.
    pub async fn get_account(&self, access_token: &str) -> Result<LichessAccount, AppError> {
        let response = self
            .http
            .get(format!("{}/api/account", self.base_url))
            .timeout(API_TIMEOUT)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::LichessApi(e.to_string()))?;

        check_response_json(response).await
    }

    /// Public profile of any user; `None` when Lichess doesn't know them.
    pub async fn get_user_public(&self, username: &str) -> Result<Option<LichessAccount>, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/api/user/{}",
                self.base_url,
                urlencoding::encode(username)
            ))
            .timeout(API_TIMEOUT)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::LichessApi(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_response_json(response).await.map(Some)
    }

    /// Export a user's games, newest first.
    ///
    /// Lines that don't parse as a game are skipped and counted. A failed
    /// request or a non-success status is an error, never an empty result.
    pub async fn get_user_games(
        &self,
        access_token: Option<&str>,
        username: &str,
        options: &GameFetchOptions,
    ) -> Result<FetchedGames, AppError> {
        let url = format!(
            "{}/api/games/user/{}",
            self.base_url,
            urlencoding::encode(username)
        );

        let mut request = self
            .http
            .get(&url)
            .timeout(GAME_STREAM_TIMEOUT)
            .header(header::ACCEPT, "application/x-ndjson")
            .query(&options.query_params());
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::LichessApi(format!("Game export request failed: {}", e)))?;
        // Non-success surfaces as LichessApi (502) so callers can tell a
        // failed export from a user with no games.
        let response = check_response(response).await?;

        let mut fetched = FetchedGames::default();
        let mut buffer: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::LichessApi(format!("Game stream interrupted: {}", e)))?;
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                fetched.push_line(&line);
            }
        }
        fetched.push_line(&buffer);

        tracing::debug!(
            username = %username,
            games = fetched.games.len(),
            skipped = fetched.skipped_lines,
            "Fetched games from Lichess"
        );
        Ok(fetched)
    }
}

/// Map error statuses to `AppError::LichessApi`.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("Lichess rate limit hit (429)");
        return Err(AppError::LichessApi(AppError::LICHESS_RATE_LIMIT.to_string()));
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::LichessApi(AppError::LICHESS_TOKEN_ERROR.to_string()));
    }

    Err(AppError::LichessApi(format!("HTTP {}: {}", status, body)))
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    check_response(response)
        .await?
        .json()
        .await
        .map_err(|e| AppError::LichessApi(format!("JSON parse error: {}", e)))
}

// ─── Game Export ─────────────────────────────────────────────────

/// Filters for the game export endpoint.
#[derive(Debug, Clone, Default)]
pub struct GameFetchOptions {
    pub max_games: u32,
    pub perf_type: Option<String>,
    pub rated: Option<bool>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl GameFetchOptions {
    pub fn new(max_games: u32) -> Self {
        Self {
            max_games,
            ..Default::default()
        }
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            (
                "max",
                self.max_games.min(MAX_GAMES_PER_REQUEST).to_string(),
            ),
            ("opening", "true".to_string()),
            ("clocks", "true".to_string()),
            ("pgnInJson", "false".to_string()),
        ];
        if let Some(perf_type) = &self.perf_type {
            params.push(("perfType", perf_type.clone()));
        }
        if let Some(since) = self.since {
            params.push(("since", to_epoch_millis(since).to_string()));
        }
        if let Some(until) = self.until {
            params.push(("until", to_epoch_millis(until).to_string()));
        }
        if let Some(rated) = self.rated {
            params.push(("rated", rated.to_string()));
        }
        params
    }
}

/// Parsed export: the games plus how many lines were unusable.
#[derive(Debug, Default)]
pub struct FetchedGames {
    pub games: Vec<RawGame>,
    pub skipped_lines: usize,
}

impl FetchedGames {
    /// Parse a whole NDJSON body.
    pub fn from_ndjson(body: &[u8]) -> Self {
        let mut fetched = Self::default();
        for line in body.split(|b| *b == b'\n') {
            fetched.push_line(line);
        }
        fetched
    }

    fn push_line(&mut self, line: &[u8]) {
        let line = line.trim_ascii();
        if line.is_empty() {
            return;
        }
        match serde_json::from_slice::<RawGame>(line) {
            Ok(game) => self.games.push(game),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed game line");
                self.skipped_lines += 1;
            }
        }
    }
}

/// Game as exported by Lichess (only the fields we keep).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGame {
    pub id: String,
    #[serde(default)]
    pub rated: Option<bool>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub perf: Option<String>,
    /// Epoch milliseconds
    pub created_at: i64,
    #[serde(default)]
    pub last_move_at: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub players: RawPlayers,
    #[serde(default)]
    pub winner: Option<Color>,
    #[serde(default)]
    pub opening: Option<RawOpening>,
    #[serde(default)]
    pub clock: Option<RawClock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayers {
    #[serde(default)]
    pub white: RawPlayer,
    #[serde(default)]
    pub black: RawPlayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayer {
    /// Absent for anonymous players and the AI
    #[serde(default)]
    pub user: Option<RawPlayerUser>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub rating_diff: Option<i32>,
}

impl RawPlayer {
    /// Display name, then account id, then "Anonymous".
    pub fn username(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.name.as_deref().or(u.id.as_deref()))
            .unwrap_or("Anonymous")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayerUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOpening {
    #[serde(default)]
    pub eco: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawClock {
    /// Seconds
    #[serde(default)]
    pub initial: Option<i32>,
    /// Seconds
    #[serde(default)]
    pub increment: Option<i32>,
}

// ─── Accounts & Tokens ───────────────────────────────────────────

/// Account or public user as returned by Lichess.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LichessAccount {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub patron: Option<bool>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub seen_at: Option<i64>,
    #[serde(default)]
    pub play_time: Option<PlayTime>,
    #[serde(default)]
    pub perfs: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayTime {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub tv: i64,
}

impl LichessAccount {
    /// Profile fields to store locally.
    pub fn into_upsert(self) -> UserUpsert {
        let play_time = self.play_time.unwrap_or_default();
        UserUpsert {
            lichess_id: self.id,
            username: self.username,
            title: self.title,
            patron: self.patron.unwrap_or(false),
            created_at_lichess: self.created_at.and_then(from_epoch_millis),
            seen_at: self.seen_at.and_then(from_epoch_millis),
            play_time_total: play_time.total,
            play_time_tv: play_time.tv,
            ratings: self
                .perfs
                .as_ref()
                .map(ratings_from_perfs)
                .unwrap_or_default(),
            profile: self.profile.unwrap_or_default(),
        }
    }
}

/// Response from `POST /api/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|secs| now + ChronoDuration::seconds(secs))
    }
}
