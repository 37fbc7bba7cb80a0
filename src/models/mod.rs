// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod game;
pub mod stats;
pub mod user;

pub use game::{Color, Game, GameFilters, GameListResponse, GameResponse, GameResult};
pub use stats::{GameStats, ResultCounts};
pub use user::{
    MeResponse, PerfCategory, PerfRating, Profile, Ratings, User, UserResponse, UserTokens,
    UserUpsert,
};
