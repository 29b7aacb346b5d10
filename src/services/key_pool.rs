// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API key rotation for the nutrition inference provider.
//!
//! Handles:
//! - Selection of the active key from a configured pool
//! - Circular, bounded rotation past keys known to be out of quota
//! - Bounded retry of remote operations that fail with a quota error
//! - Persisting key status so exhaustion survives restarts
//!
//! The local quota counters are only a hint that lets us skip keys we
//! already know are dead. The provider's error response is what actually
//! marks a key exhausted.

use crate::db::local::{keys, LocalStore};
use crate::models::{Credential, PoolState};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Marker the provider puts in quota error bodies (`insufficient_quota`).
const QUOTA_MARKER: &str = "quota";

/// Failure of a single remote call made with one credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("rate limited by provider (HTTP 429)")]
    RateLimited,

    #[error("provider quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("provider request failed: {0}")]
    Transport(String),
}

impl ProviderError {
    /// Classify a non-success HTTP response.
    ///
    /// A 429 status or a quota marker in the body both count as quota errors.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 {
            return ProviderError::RateLimited;
        }
        if body.to_ascii_lowercase().contains(QUOTA_MARKER) {
            return ProviderError::QuotaExceeded(body);
        }
        ProviderError::Http { status, body }
    }

    /// Quota-class errors trigger rotation and retry; everything else is final.
    pub fn is_quota(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::QuotaExceeded(_)
        )
    }
}

/// Errors surfaced by the key pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("key pool needs at least one API key")]
    Empty,

    #[error("all API keys have reached their quota")]
    PoolExhausted,

    #[error("maximum number of attempts reached ({attempts})")]
    RetriesExhausted { attempts: u32 },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Pool of API keys with failover.
///
/// Construct once and share behind an `Arc`. All mutation goes through a
/// single mutex, which is never held across a remote call.
pub struct KeyPool {
    state: Mutex<PoolState>,
    store: Option<Arc<LocalStore>>,
}

impl std::fmt::Debug for KeyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPool")
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl KeyPool {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Build a pool from configured tokens, then restore any key status
    /// persisted by a previous run.
    pub async fn new<I, S>(tokens: I, store: Arc<LocalStore>) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = fresh_state(tokens)?;

        match store.get_json::<PoolState>(keys::API_KEYS_STATUS).await {
            Ok(Some(persisted)) if persisted.is_valid() => {
                tracing::info!(
                    keys = persisted.credentials.len(),
                    active_index = persisted.active_index,
                    exhausted = persisted.exhausted_count(),
                    "Restored API key status"
                );
                state = persisted;
            }
            Ok(Some(_)) => {
                tracing::warn!("Ignoring invalid persisted API key status");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Error loading API key status");
            }
        }

        Ok(Self {
            state: Mutex::new(state),
            store: Some(store),
        })
    }

    /// Build a pool that keeps its status in memory only.
    pub fn in_memory<I, S>(tokens: I) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            state: Mutex::new(fresh_state(tokens)?),
            store: None,
        })
    }

    /// The credential currently in use.
    pub async fn current_credential(&self) -> Credential {
        let state = self.state.lock().await;
        active_of(&state)
    }

    /// Copy of the whole pool state.
    pub async fn snapshot(&self) -> PoolState {
        self.state.lock().await.clone()
    }

    /// Mark the active key exhausted and rotate to the next key with quota.
    ///
    /// Fails with [`PoolError::PoolExhausted`] when no key has quota left;
    /// the active index is then left unchanged.
    pub async fn mark_active_exhausted(&self) -> Result<(), PoolError> {
        let mut state = self.state.lock().await;
        self.rotate_locked(&mut state).await
    }

    /// Like [`mark_active_exhausted`](Self::mark_active_exhausted), but only
    /// rotates if `token` is still the active key. If a concurrent caller
    /// already rotated away from it, the key is just zeroed.
    async fn mark_exhausted(&self, token: &str) -> Result<(), PoolError> {
        let mut state = self.state.lock().await;

        let still_active = state
            .active()
            .is_some_and(|credential| credential.token == token);
        if still_active {
            return self.rotate_locked(&mut state).await;
        }

        if let Some(credential) = state.credentials.iter_mut().find(|c| c.token == token) {
            credential.remaining_quota = 0;
        }
        tracing::debug!("API key already rotated by a concurrent request");
        self.persist(&state).await;
        Ok(())
    }

    async fn rotate_locked(&self, state: &mut PoolState) -> Result<(), PoolError> {
        let from = state.active_index;
        let Some(to) = state.exhaust_active_and_rotate() else {
            tracing::warn!(
                keys = state.credentials.len(),
                "All API keys have reached their quota"
            );
            // The active key was still zeroed.
            self.persist(state).await;
            return Err(PoolError::PoolExhausted);
        };

        tracing::info!(from, to, "Rotated to next API key");
        self.persist(state).await;
        Ok(())
    }

    async fn persist(&self, state: &PoolState) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.set_json(keys::API_KEYS_STATUS, state).await {
            tracing::warn!(error = %e, "Error saving API key status");
        }
    }

    /// Run `operation` with the active credential, rotating and retrying on
    /// quota errors.
    ///
    /// - Success returns immediately.
    /// - A quota error marks the key exhausted and costs one attempt.
    /// - Any other error is returned at once without touching the pool.
    /// - After `max_attempts` quota errors, fails with `RetriesExhausted`.
    pub async fn invoke<T, F, Fut>(&self, mut operation: F, max_attempts: u32) -> Result<T, PoolError>
    where
        F: FnMut(Credential) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempts = 0;

        while attempts < max_attempts {
            let credential = self.current_credential().await;
            let token = credential.token.clone();

            match operation(credential).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_quota() => {
                    attempts += 1;
                    tracing::warn!(attempt = attempts, error = %e, "API key hit its quota");
                    self.mark_exhausted(&token).await?;
                }
                Err(e) => return Err(PoolError::Provider(e)),
            }
        }

        Err(PoolError::RetriesExhausted { attempts })
    }

    /// [`invoke`](Self::invoke) with [`DEFAULT_MAX_ATTEMPTS`](Self::DEFAULT_MAX_ATTEMPTS).
    pub async fn invoke_default<T, F, Fut>(&self, operation: F) -> Result<T, PoolError>
    where
        F: FnMut(Credential) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        self.invoke(operation, Self::DEFAULT_MAX_ATTEMPTS).await
    }
}

fn fresh_state<I, S>(tokens: I) -> Result<PoolState, PoolError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let state = PoolState::from_tokens(tokens);
    if state.credentials.is_empty() {
        return Err(PoolError::Empty);
    }
    Ok(state)
}

fn active_of(state: &PoolState) -> Credential {
    // Index is kept in range by construction and by rotation.
    state.credentials[state.active_index].clone()
}
