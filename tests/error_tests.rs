// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{http::StatusCode, response::IntoResponse};
use lichess_stats::error::AppError;

#[test]
fn test_is_lichess_token_error_matches() {
    let err = AppError::LichessApi(AppError::LICHESS_TOKEN_ERROR.to_string());
    assert!(err.is_lichess_token_error());

    assert!(AppError::MissingLichessToken.is_lichess_token_error());
}

#[test]
fn test_is_lichess_token_error_no_match() {
    let err = AppError::LichessApi(AppError::LICHESS_RATE_LIMIT.to_string());
    assert!(!err.is_lichess_token_error());

    // Upstream bodies that merely mention a token are not token errors
    let err = AppError::LichessApi(
        "HTTP 500 Internal Server Error: token service unavailable".to_string(),
    );
    assert!(!err.is_lichess_token_error());

    let err = AppError::LichessApi("Game export request failed: invalid token".to_string());
    assert!(!err.is_lichess_token_error());

    let err = AppError::BadRequest(AppError::LICHESS_TOKEN_ERROR.to_string());
    assert!(!err.is_lichess_token_error());
}

#[test]
fn test_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        (AppError::InvalidOAuthState, StatusCode::BAD_REQUEST),
        (AppError::MissingLichessToken, StatusCode::BAD_REQUEST),
        (AppError::LichessApi("x".into()), StatusCode::BAD_GATEWAY),
        (
            AppError::Database("x".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            AppError::Internal(anyhow::anyhow!("x")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, expected) in cases {
        let label = err.to_string();
        assert_eq!(err.into_response().status(), expected, "{label}");
    }
}

#[tokio::test]
async fn test_internal_details_not_exposed() {
    let response = AppError::Database("no such table: users".into()).into_response();
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}
