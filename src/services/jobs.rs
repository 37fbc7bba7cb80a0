// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background sync jobs.
//!
//! Jobs are pushed onto a bounded in-process queue and executed one at a
//! time by a worker task. The same job functions back the `/tasks/*`
//! endpoints so an external scheduler can drive them instead.

use crate::db::Database;
use crate::error::AppError;
use crate::services::lichess::{GameFetchOptions, LichessClient};
use crate::services::sync::sync_user_games;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Default batch size for a single-user sync job.
pub const DEFAULT_USER_SYNC_MAX_GAMES: u32 = 100;

const QUEUE_CAPACITY: usize = 64;

/// A unit of background work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    SyncUser { user_id: String, max_games: u32 },
    SyncAllUsers { max_games: u32 },
}

/// Payload for `/tasks/sync-user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncUserPayload {
    pub user_id: String,
    #[serde(default)]
    pub max_games: Option<u32>,
}

/// Payload for `/tasks/sync-all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncAllPayload {
    #[serde(default)]
    pub max_games: Option<u32>,
}

/// Per-user outcome of a sync job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJobResult {
    pub user_id: String,
    pub fetched: usize,
    pub saved: usize,
    pub synced_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncJobResult {
    fn failed(user_id: &str, error: String) -> Self {
        Self {
            user_id: user_id.to_string(),
            fetched: 0,
            saved: 0,
            synced_at: Utc::now(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Sync one user's recent games. Failures are reported in the result.
pub async fn run_sync_user(
    db: &Database,
    lichess: &LichessClient,
    user_id: &str,
    max_games: u32,
) -> SyncJobResult {
    let user = match db.get_user(user_id).await {
        Ok(Some(user)) if user.access_token.is_some() => user,
        Ok(_) => {
            return SyncJobResult::failed(user_id, "User not found or no access token".into())
        }
        Err(e) => return SyncJobResult::failed(user_id, e.to_string()),
    };

    match sync_user_games(db, lichess, &user, &GameFetchOptions::new(max_games)).await {
        Ok(report) => SyncJobResult {
            user_id: user.id,
            fetched: report.fetched,
            saved: report.saved,
            synced_at: Utc::now(),
            error: None,
        },
        Err(e) => {
            if e.is_lichess_token_error() {
                tracing::warn!(user_id = %user.id, "Lichess rejected stored token");
            }
            tracing::error!(user_id = %user.id, error = %e, "Game sync failed");
            SyncJobResult::failed(&user.id, format!("Failed to fetch games: {}", e))
        }
    }
}

/// Sync every user with a stored token. One user's failure doesn't stop
/// the sweep.
pub async fn run_sync_all(
    db: &Database,
    lichess: &LichessClient,
    max_games: u32,
) -> Result<Vec<SyncJobResult>, AppError> {
    let users = db.list_users_with_tokens().await?;
    let mut results = Vec::with_capacity(users.len());

    for user in users {
        results.push(run_sync_user(db, lichess, &user.id, max_games).await);
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    tracing::info!(users = results.len(), failed, "Sync sweep complete");
    Ok(results)
}

/// Handle for submitting jobs to the background worker.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
}

impl JobQueue {
    /// Spawn the worker and return a handle to its queue.
    pub fn start(db: Database, lichess: LichessClient) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_worker(db, lichess, rx));
        Self { tx }
    }

    /// Queue a job without waiting for it to run.
    pub fn enqueue(&self, job: Job) -> Result<(), AppError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => {
                tracing::warn!(job = ?job, "Job queue full, dropping job");
                AppError::Internal(anyhow::anyhow!("Job queue is full"))
            }
            mpsc::error::TrySendError::Closed(_) => {
                AppError::Internal(anyhow::anyhow!("Job worker has stopped"))
            }
        })
    }
}

async fn run_worker(db: Database, lichess: LichessClient, mut rx: mpsc::Receiver<Job>) {
    tracing::info!("Job worker started");

    while let Some(job) = rx.recv().await {
        tracing::debug!(job = ?job, "Running job");
        match job {
            Job::SyncUser { user_id, max_games } => {
                let result = run_sync_user(&db, &lichess, &user_id, max_games).await;
                tracing::info!(
                    user_id = %result.user_id,
                    fetched = result.fetched,
                    saved = result.saved,
                    error = result.error.as_deref().unwrap_or(""),
                    "Sync job finished"
                );
            }
            Job::SyncAllUsers { max_games } => {
                if let Err(e) = run_sync_all(&db, &lichess, max_games).await {
                    tracing::error!(error = %e, "Sync sweep failed");
                }
            }
        }
    }

    tracing::info!("Job worker stopped");
}

/// Longest accepted sweep interval (one year).
const MAX_SYNC_INTERVAL_MINUTES: u64 = 366 * 24 * 60;

/// Sweep period for `interval_minutes`; `None` when zero or too large.
fn sweep_period(interval_minutes: u64) -> Option<Duration> {
    if interval_minutes > MAX_SYNC_INTERVAL_MINUTES {
        return None;
    }
    interval_minutes
        .checked_mul(60)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Enqueue a full sync sweep every `interval_minutes`.
pub fn start_periodic_sync(queue: JobQueue, interval_minutes: u64, max_games: u32) {
    let Some(period) = sweep_period(interval_minutes) else {
        tracing::error!(interval_minutes, "Invalid sync interval, periodic sync not started");
        return;
    };

    tokio::spawn(async move {
        tracing::info!(interval_minutes, max_games, "Starting periodic game sync");

        let mut ticker = interval(period);
        // The first tick completes immediately; skip it so startup stays quiet.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = queue.enqueue(Job::SyncAllUsers { max_games }) {
                tracing::error!(error = %e, "Failed to enqueue sync sweep");
            }
        }
    });
}
