// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end game sync tests against a fake Lichess export.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;

mod common;

const JAN_1_MS: i64 = 1_704_067_200_000;

fn export_body() -> String {
    [
        common::game_line("aaaa0001", "Alice", "Bob", Some("white"), JAN_1_MS),
        common::game_line("aaaa0002", "Carol", "alice", Some("white"), JAN_1_MS + 1000),
        common::game_line("aaaa0003", "Alice", "Dave", None, JAN_1_MS + 2000),
        "{ not json".to_string(),
        String::new(),
        // Alice didn't play this one
        common::game_line("aaaa0004", "Bob", "Carol", Some("black"), JAN_1_MS + 3000),
    ]
    .join("\n")
}

async fn post(app: &Router, token: &str, uri: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_sync_counts_and_is_idempotent() {
    let base_url = common::spawn_fake_lichess(common::FakeLichess {
        games_ndjson: export_body(),
        ..Default::default()
    })
    .await;
    let (app, state) = common::create_test_app_with_lichess(&base_url).await;
    common::seed_user(&state, "Alice", Some(common::FAKE_ACCESS_TOKEN)).await;
    let token = common::create_test_jwt("Alice", &state.config.jwt_signing_key);

    let response = post(&app, &token, "/api/games/me/sync").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["fetched"], 4);
    assert_eq!(body["saved"], 3);
    assert_eq!(body["skipped"], 1);
    assert_eq!(body["message"], "Successfully synced 3 new games");

    let user = state.db.get_user("alice").await.unwrap().unwrap();
    let first_sync = user.last_games_sync.expect("sync time recorded");

    let response = post(&app, &token, "/api/games/me/sync?max_games=10").await;
    let body = common::body_json(response).await;
    assert_eq!(body["fetched"], 4);
    assert_eq!(body["saved"], 0);
    assert_eq!(body["message"], "Successfully synced 0 new games");

    // Nothing new, so the sync time is untouched
    let user = state.db.get_user("alice").await.unwrap().unwrap();
    assert_eq!(user.last_games_sync, Some(first_sync));

    let game = state.db.get_game("alice", "aaaa0002").await.unwrap().unwrap();
    assert_eq!(game.user_color, lichess_stats::models::Color::Black);
    assert_eq!(game.result, lichess_stats::models::GameResult::Loss);
    assert!(state.db.get_game("alice", "aaaa0004").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sync_rejects_out_of_range_max_games() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "Alice", Some(common::FAKE_ACCESS_TOKEN)).await;
    let token = common::create_test_jwt("Alice", &state.config.jwt_signing_key);

    for uri in [
        "/api/games/me/sync?max_games=0",
        "/api/games/me/sync?max_games=301",
    ] {
        let response = post(&app, &token, uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_sync_without_lichess_token() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "Alice", None).await;
    let token = common::create_test_jwt("Alice", &state.config.jwt_signing_key);

    let response = post(&app, &token, "/api/games/me/sync").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "missing_lichess_token");
}

#[tokio::test]
async fn test_sync_export_failure_is_bad_gateway() {
    let base_url = common::spawn_fake_lichess(common::FakeLichess {
        fail_exports: true,
        ..Default::default()
    })
    .await;
    let (app, state) = common::create_test_app_with_lichess(&base_url).await;
    common::seed_user(&state, "Alice", Some(common::FAKE_ACCESS_TOKEN)).await;
    let token = common::create_test_jwt("Alice", &state.config.jwt_signing_key);

    let response = post(&app, &token, "/api/games/me/sync").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "lichess_error");

    let user = state.db.get_user("alice").await.unwrap().unwrap();
    assert!(user.last_games_sync.is_none());
}

#[tokio::test]
async fn test_sync_with_rejected_token_is_bad_gateway() {
    let base_url = common::spawn_fake_lichess(common::FakeLichess::default()).await;
    let (app, state) = common::create_test_app_with_lichess(&base_url).await;
    common::seed_user(&state, "Alice", Some("lio_revoked")).await;
    let token = common::create_test_jwt("Alice", &state.config.jwt_signing_key);

    let response = post(&app, &token, "/api/games/me/sync").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = common::body_json(response).await;
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains(lichess_stats::error::AppError::LICHESS_TOKEN_ERROR));
}

#[tokio::test]
async fn test_stats_after_sync() {
    let base_url = common::spawn_fake_lichess(common::FakeLichess {
        games_ndjson: export_body(),
        ..Default::default()
    })
    .await;
    let (app, state) = common::create_test_app_with_lichess(&base_url).await;
    common::seed_user(&state, "Alice", Some(common::FAKE_ACCESS_TOKEN)).await;
    let token = common::create_test_jwt("Alice", &state.config.jwt_signing_key);

    let empty = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/games/stats/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let empty = common::body_json(empty).await;
    assert_eq!(empty["total"], 0);
    assert_eq!(empty["win_rate"], 0.0);

    post(&app, &token, "/api/games/me/sync").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/games/stats/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["results"]["win"], 1);
    assert_eq!(body["results"]["loss"], 1);
    assert_eq!(body["results"]["draw"], 1);
    assert_eq!(body["by_type"]["blitz"], 3);
    assert_eq!(body["win_rate"], 33.3);
}
