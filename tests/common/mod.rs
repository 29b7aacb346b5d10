// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::Arc;
use trac_cal::config::Config;
use trac_cal::db::{FirestoreDb, LocalStore};
use trac_cal::middleware::auth::create_jwt;
use trac_cal::models::{ActivityLevel, Gender, UserProfile};
use trac_cal::routes::create_router;
use trac_cal::services::{KeyPool, NutritionService, ProfileStore};
use trac_cal::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// 30-year-old, moderately active male aiming to lose 5 kg.
#[allow(dead_code)]
pub fn sample_profile() -> UserProfile {
    UserProfile {
        email: "alice@example.com".to_string(),
        age: 30,
        gender: Gender::Male,
        height_cm: 175.0,
        weight_kg: 75.0,
        target_weight_kg: 70.0,
        activity_level: ActivityLevel::Moderate,
        daily_calorie_goal: None,
        water_goal_ml: None,
    }
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let local_store = Arc::new(LocalStore::in_memory());
    let key_pool = Arc::new(
        KeyPool::in_memory(config.openai_api_keys.clone()).expect("Test keys are non-empty"),
    );
    let nutrition_service =
        NutritionService::from_config(&config, key_pool).expect("Failed to build nutrition client");
    let profile_store = ProfileStore::new(local_store);

    let state = Arc::new(AppState {
        config,
        db,
        profile_store,
        nutrition_service,
    });

    (create_router(state.clone()), state)
}

/// Create a session token for `user_id`.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    create_jwt(user_id, signing_key).expect("Failed to sign test JWT")
}
