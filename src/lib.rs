// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! trac-cal: personal nutrition and activity tracker backend.
//!
//! This crate provides the API the tracker app talks to: nutrition lookups
//! through a rotating pool of inference-provider API keys, and local-first
//! storage of the user's profile with best-effort sync to Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{NutritionService, ProfileStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub profile_store: ProfileStore,
    pub nutrition_service: NutritionService,
}
