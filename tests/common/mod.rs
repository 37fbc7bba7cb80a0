// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use lichess_stats::config::Config;
use lichess_stats::db::Database;
use lichess_stats::middleware::auth::create_jwt;
use lichess_stats::models::{User, UserTokens, UserUpsert};
use lichess_stats::routes::create_router;
use lichess_stats::services::{InMemoryPkceStore, JobQueue, LichessClient};
use lichess_stats::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Token the fake Lichess hands out and accepts.
#[allow(dead_code)]
pub const FAKE_ACCESS_TOKEN: &str = "lio_fake_token";
/// Authorization code the fake Lichess accepts.
#[allow(dead_code)]
pub const FAKE_AUTH_CODE: &str = "good-code";

/// Create a test app against an unreachable Lichess.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default()).await
}

/// Create a test app talking to the Lichess at `base_url`.
#[allow(dead_code)]
pub async fn create_test_app_with_lichess(base_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.lichess_base_url = base_url.to_string();
    create_test_app_with_config(config).await
}

#[allow(dead_code)]
pub async fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to open in-memory database");
    let lichess = LichessClient::new(&config);
    let pkce_store = Arc::new(InMemoryPkceStore::new(Duration::from_secs(
        config.oauth_state_ttl_secs,
    )));
    let jobs = JobQueue::start(db.clone(), lichess.clone());

    let state = Arc::new(AppState {
        config,
        db,
        lichess,
        pkce_store,
        jobs,
    });

    (create_router(state.clone()), state)
}

/// Session token for `username` signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(username: &str, signing_key: &[u8]) -> String {
    create_jwt(&username.to_lowercase(), username, signing_key, 60).expect("JWT creation")
}

/// Store a user, optionally with a Lichess token.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, username: &str, access_token: Option<&str>) -> User {
    let upsert = UserUpsert {
        lichess_id: username.to_lowercase(),
        username: username.to_string(),
        title: None,
        patron: false,
        created_at_lichess: None,
        seen_at: None,
        play_time_total: 0,
        play_time_tv: 0,
        ratings: Default::default(),
        profile: Default::default(),
    };
    let tokens = access_token.map(|t| UserTokens {
        access_token: t.to_string(),
        refresh_token: None,
        expires_at: None,
    });
    state
        .db
        .upsert_user(&upsert, tokens.as_ref())
        .await
        .expect("Failed to seed user")
}

/// Collect a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// One exported game line in the shape Lichess produces.
#[allow(dead_code)]
pub fn game_line(id: &str, white: &str, black: &str, winner: Option<&str>, created_ms: i64) -> String {
    let mut game = json!({
        "id": id,
        "rated": true,
        "variant": "standard",
        "speed": "blitz",
        "perf": "blitz",
        "createdAt": created_ms,
        "lastMoveAt": created_ms + 300_000,
        "status": "resign",
        "players": {
            "white": {"user": {"name": white, "id": white.to_lowercase()}, "rating": 1500, "ratingDiff": 5},
            "black": {"user": {"name": black, "id": black.to_lowercase()}, "rating": 1520, "ratingDiff": -5}
        },
        "opening": {"eco": "C20", "name": "King's Pawn Game", "ply": 2},
        "clock": {"initial": 300, "increment": 3, "totalTime": 420}
    });
    if let Some(w) = winner {
        game["winner"] = json!(w);
    }
    game.to_string()
}

// ─── Fake Lichess ────────────────────────────────────────────

/// Canned responses for the fake Lichess server.
#[derive(Clone, Default)]
pub struct FakeLichess {
    /// NDJSON body served for every game export
    pub games_ndjson: String,
    /// Blitz rating reported by `/api/account`
    pub blitz_rating: i32,
    /// Make the game export fail with 500
    pub fail_exports: bool,
}

fn account_json(username: &str, blitz: i32) -> Value {
    json!({
        "id": username.to_lowercase(),
        "username": username,
        "patron": false,
        "createdAt": 1_600_000_000_000i64,
        "seenAt": 1_700_000_000_000i64,
        "playTime": {"total": 7200, "tv": 0},
        "perfs": {
            "blitz": {"games": 42, "rating": blitz, "rd": 60, "prog": 8},
            "storm": {"runs": 3, "score": 20}
        },
        "profile": {"country": "GB", "bio": "test account"}
    })
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h == format!("Bearer {}", FAKE_ACCESS_TOKEN))
        .unwrap_or(false)
}

async fn fake_token(Form(form): Form<HashMap<String, String>>) -> Response {
    let valid = form.get("grant_type").map(String::as_str) == Some("authorization_code")
        && form.get("code").map(String::as_str) == Some(FAKE_AUTH_CODE)
        && form.get("code_verifier").is_some_and(|v| !v.is_empty())
        && form.get("client_id").is_some();
    if !valid {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"}))).into_response();
    }
    Json(json!({
        "token_type": "Bearer",
        "access_token": FAKE_ACCESS_TOKEN,
        "expires_in": 31_536_000
    }))
    .into_response()
}

async fn fake_revoke() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn fake_account(State(fake): State<Arc<FakeLichess>>, headers: HeaderMap) -> Response {
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(account_json("Alice", fake.blitz_rating)).into_response()
}

async fn fake_public_user(Path(username): Path<String>) -> Response {
    if username.eq_ignore_ascii_case("magnus") {
        return Json(account_json("Magnus", 2900)).into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn fake_games(State(fake): State<Arc<FakeLichess>>, headers: HeaderMap) -> Response {
    if fake.fail_exports {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    if !bearer_ok(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        fake.games_ndjson.clone(),
    )
        .into_response()
}

/// Serve `fake` on an ephemeral port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_fake_lichess(fake: FakeLichess) -> String {
    let app = Router::new()
        .route("/api/token", post(fake_token).delete(fake_revoke))
        .route("/api/account", get(fake_account))
        .route("/api/user/{username}", get(fake_public_user))
        .route("/api/games/user/{username}", get(fake_games))
        .with_state(Arc::new(fake));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake Lichess");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}
