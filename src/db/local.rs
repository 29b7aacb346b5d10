// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-local durable key-value storage.
//!
//! Values are strings (usually JSON) kept in a single JSON object file,
//! rewritten atomically on every change. An in-memory backend is provided
//! for tests.
//!
//! The first access in a process checks the schema-version marker and wipes
//! every key when it does not match [`CACHE_VERSION`] or when the file cannot
//! be parsed at all. A successful check happens at most once, even when
//! several tasks race to be first; a failed one is retried on the next access.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, OnceCell};

/// Current layout of locally stored values.
pub const CACHE_VERSION: &str = "1.0.0";

/// Storage keys as constants.
pub mod keys {
    /// Prefix of per-user profile entries; see [`user_profile`].
    pub const USER_PROFILE: &str = "user_profile";
    pub const API_KEYS_STATUS: &str = "api_keys_status";
    pub const CACHE_VERSION: &str = "cache_version";

    /// Key of `user_id`'s profile entry.
    pub fn user_profile(user_id: &str) -> String {
        format!("{}:{}", USER_PROFILE, user_id)
    }
}

/// Local storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

enum Backend {
    File(PathBuf),
    Memory(StdMutex<HashMap<String, String>>),
}

/// Local key-value store.
pub struct LocalStore {
    backend: Backend,
    /// Serializes read-modify-write cycles on the backing file.
    write_lock: Mutex<()>,
    ready: OnceCell<()>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match &self.backend {
            Backend::File(path) => path.display().to_string(),
            Backend::Memory(_) => "memory".to_string(),
        };
        f.debug_struct("LocalStore")
            .field("backend", &backend)
            .field("ready", &self.ready.initialized())
            .finish()
    }
}

impl LocalStore {
    /// Store backed by a JSON file. No I/O happens until first use.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_backend(Backend::File(path.into()))
    }

    /// Volatile store, for tests and platforms without durable storage.
    pub fn in_memory() -> Self {
        Self::with_memory(HashMap::new())
    }

    /// Volatile store pre-populated with entries (as if written by an
    /// earlier process).
    pub fn with_memory(entries: HashMap<String, String>) -> Self {
        Self::with_backend(Backend::Memory(StdMutex::new(entries)))
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
            ready: OnceCell::new(),
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File(path) => Some(path),
            Backend::Memory(_) => None,
        }
    }

    // ─── Initialization ─────────────────────────────────────────

    /// Run the schema-version check, once per process on success.
    ///
    /// A failed check is logged and left unmarked, so the next access tries
    /// again. The operation that triggered it still runs.
    pub async fn ensure_initialized(&self) {
        if let Err(e) = self.ready.get_or_try_init(|| self.migrate()).await {
            tracing::error!(error = %e, "Error initializing local storage");
        }
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        match self.load_entries().await {
            Ok(entries) => {
                let version = entries.get(keys::CACHE_VERSION).map(String::as_str);
                if version == Some(CACHE_VERSION) {
                    return Ok(());
                }

                tracing::info!(
                    found = version.unwrap_or("none"),
                    expected = CACHE_VERSION,
                    dropped = entries.len(),
                    "Local storage version mismatch, clearing"
                );
            }
            Err(StoreError::Json(e)) => {
                tracing::warn!(error = %e, "Local storage unreadable, clearing");
            }
            Err(e) => return Err(e),
        }

        let mut fresh = HashMap::new();
        fresh.insert(keys::CACHE_VERSION.to_string(), CACHE_VERSION.to_string());
        self.store_entries(&fresh).await
    }

    // ─── Key-Value Operations ───────────────────────────────────

    /// Read a raw value.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.ensure_initialized().await;
        let mut entries = self.load_entries().await?;
        Ok(entries.remove(key))
    }

    /// Write a raw value.
    pub async fn set_item(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.ensure_initialized().await;
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_entries().await?;
        entries.insert(key.to_string(), value);
        self.store_entries(&entries).await
    }

    /// Remove a value. Missing keys are not an error.
    pub async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.ensure_initialized().await;
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_entries().await?;
        if entries.remove(key).is_some() {
            self.store_entries(&entries).await?;
        }
        Ok(())
    }

    /// Read and deserialize a JSON value.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_item(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and write a JSON value.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, raw).await
    }

    // ─── Backends ───────────────────────────────────────────────

    async fn load_entries(&self) -> Result<HashMap<String, String>, StoreError> {
        match &self.backend {
            Backend::Memory(entries) => {
                let snapshot = entries
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .clone();
                Ok(snapshot)
            }
            Backend::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(content) => Ok(serde_json::from_str(&content)?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
                Err(source) => Err(StoreError::Io {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }

    async fn store_entries(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        match &self.backend {
            Backend::Memory(slot) => {
                *slot
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner) = entries.clone();
                Ok(())
            }
            Backend::File(path) => write_atomic(path, &serde_json::to_string_pretty(entries)?).await,
        }
    }
}

/// Write via temp file + rename so a crash never leaves a torn file.
async fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
    }

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(io_err)?;
    tokio::fs::rename(&temp_path, path).await.map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(io_err)?;
    }

    tracing::debug!(path = %path.display(), "Local store written");
    Ok(())
}
