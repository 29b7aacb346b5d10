// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local-first user profile storage.
//!
//! Every profile belongs to one authenticated user id; the cache and the
//! durable entry (`user_profile:{user_id}`) are both keyed by it.
//!
//! Reads resolve through an ordered fallback chain:
//! 1. In-process cache (no I/O)
//! 2. Device-local durable store
//! 3. Remote collaborator (result is copied locally)
//! 4. The default profile
//!
//! Writes commit locally first. That step must succeed. Replication to the
//! remote store happens afterwards, and its outcome is reported next to the
//! saved profile rather than as an error.

use crate::db::local::{keys, LocalStore};
use crate::error::AppError;
use crate::models::UserProfile;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of the remote half of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replication {
    Synced,
    Failed(String),
}

/// Result of a successful local commit.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// Profile as persisted, with derived goals filled in.
    pub profile: UserProfile,
    pub replication: Replication,
}

impl SaveOutcome {
    pub fn is_synced(&self) -> bool {
        self.replication == Replication::Synced
    }
}

/// Owner of the locally stored user profiles.
#[derive(Debug)]
pub struct ProfileStore {
    store: Arc<LocalStore>,
    cache: RwLock<HashMap<String, UserProfile>>,
}

impl ProfileStore {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cached profile of `user_id`, if any. No I/O.
    pub async fn cached_profile(&self, user_id: &str) -> Option<UserProfile> {
        self.cache.read().await.get(user_id).cloned()
    }

    /// Get the user's profile. Never fails; falls back to the default profile.
    pub async fn get_profile<F, Fut>(&self, user_id: &str, remote_fallback: F) -> UserProfile
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<UserProfile>, AppError>>,
    {
        if let Some(profile) = self.cached_profile(user_id).await {
            return profile;
        }

        let key = keys::user_profile(user_id);

        if let Some(profile) = self.read_local(&key).await {
            self.cache_insert(user_id, profile.clone()).await;
            return profile;
        }

        match remote_fallback().await {
            Ok(Some(profile)) => {
                tracing::debug!(user_id, "Profile loaded from remote store");
                self.cache_insert(user_id, profile.clone()).await;
                if let Err(e) = self.store.set_json(&key, &profile).await {
                    tracing::warn!(user_id, error = %e, "Failed to copy remote profile locally");
                }
                profile
            }
            Ok(None) => {
                tracing::debug!(user_id, "No profile found, using default");
                UserProfile::default()
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Error getting user profile, using default");
                UserProfile::default()
            }
        }
    }

    async fn read_local(&self, key: &str) -> Option<UserProfile> {
        match self.store.get_json::<UserProfile>(key).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(key, error = %e, "Error reading profile from storage");
                None
            }
        }
    }

    async fn cache_insert(&self, user_id: &str, profile: UserProfile) -> Option<UserProfile> {
        self.cache.write().await.insert(user_id.to_string(), profile)
    }

    /// Save the user's profile: recompute goals, commit locally, then try
    /// `remote_sync`.
    ///
    /// Only a local persistence failure is returned as an error. In that case
    /// the user's cache entry is restored to what it held before the call.
    pub async fn save_profile<F, Fut>(
        &self,
        user_id: &str,
        profile: UserProfile,
        remote_sync: F,
    ) -> Result<SaveOutcome, AppError>
    where
        F: FnOnce(UserProfile) -> Fut,
        Fut: Future<Output = Result<(), AppError>>,
    {
        let profile = profile.with_derived_goals();

        let previous = self.cache_insert(user_id, profile.clone()).await;

        if let Err(e) = self.store.set_json(&keys::user_profile(user_id), &profile).await {
            tracing::error!(user_id, error = %e, "Error saving profile locally");
            let mut cache = self.cache.write().await;
            match previous {
                Some(previous) => cache.insert(user_id.to_string(), previous),
                None => cache.remove(user_id),
            };
            return Err(AppError::LocalPersist(e.to_string()));
        }

        let replication = match remote_sync(profile.clone()).await {
            Ok(()) => Replication::Synced,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Error syncing profile to remote store");
                Replication::Failed(e.to_string())
            }
        };

        tracing::info!(
            user_id,
            daily_calorie_goal = profile.daily_calorie_goal,
            water_goal_ml = profile.water_goal_ml,
            synced = replication == Replication::Synced,
            "Profile saved"
        );

        Ok(SaveOutcome {
            profile,
            replication,
        })
    }

    /// Forget the local copy of the user's profile (e.g. on sign-out).
    pub async fn clear_local_profile(&self, user_id: &str) -> Result<(), AppError> {
        self.cache.write().await.remove(user_id);
        self.store
            .remove_item(&keys::user_profile(user_id))
            .await
            .map_err(|e| AppError::LocalPersist(format!("Failed to clear profile: {}", e)))
    }
}
