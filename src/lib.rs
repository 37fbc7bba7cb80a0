// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lichess Stats: game history and statistics for Lichess players
//!
//! This crate provides the backend API: Lichess OAuth login, game import
//! from the Lichess export API, and filtered views and aggregates over the
//! imported games.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{JobQueue, LichessClient, PkceStore};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub lichess: LichessClient,
    pub pkce_store: Arc<dyn PkceStore>,
    pub jobs: JobQueue,
}
