// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PKCE (RFC 7636) helpers and the pending-login store.
//!
//! A login starts by generating a verifier/challenge pair and a random
//! `state`. The verifier is kept server-side keyed by `state` until the
//! callback redeems it, at most once and before it expires.

use crate::error::AppError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

const VERIFIER_BYTES: usize = 64;
const STATE_BYTES: usize = 32;

/// Verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

fn random_token(len: usize) -> Result<String, AppError> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// `BASE64URL(SHA256(verifier))` without padding.
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

pub fn generate_pkce_pair() -> Result<PkcePair, AppError> {
    let verifier = random_token(VERIFIER_BYTES)?;
    let challenge = code_challenge(&verifier);
    Ok(PkcePair {
        verifier,
        challenge,
    })
}

pub fn generate_state() -> Result<String, AppError> {
    random_token(STATE_BYTES)
}

/// Keyed storage for verifiers awaiting their callback.
///
/// The in-process implementation only works for a single server instance;
/// an external keyed store can implement this trait instead.
pub trait PkceStore: Send + Sync {
    /// Remember `verifier` for `state`.
    fn insert(&self, state: String, verifier: String);

    /// Remove and return the verifier for `state` if it has not expired.
    fn take(&self, state: &str) -> Option<String>;

    /// Drop expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize;
}

struct PendingLogin {
    verifier: String,
    expires_at: Instant,
}

/// `DashMap`-backed store with a fixed time-to-live.
pub struct InMemoryPkceStore {
    entries: DashMap<String, PendingLogin>,
    ttl: Duration,
}

impl InMemoryPkceStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PkceStore for InMemoryPkceStore {
    fn insert(&self, state: String, verifier: String) {
        self.purge_expired();
        self.entries.insert(
            state,
            PendingLogin {
                verifier,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    fn take(&self, state: &str) -> Option<String> {
        let (_, pending) = self.entries.remove(state)?;
        if pending.expires_at <= Instant::now() {
            tracing::debug!("Discarding expired OAuth state");
            return None;
        }
        Some(pending.verifier)
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, pending| pending.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}
