// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod jobs;
pub mod lichess;
pub mod pkce;
pub mod sync;

pub use jobs::{Job, JobQueue, SyncJobResult};
pub use lichess::{FetchedGames, GameFetchOptions, LichessClient};
pub use pkce::{InMemoryPkceStore, PkceStore};
pub use sync::SyncReport;
