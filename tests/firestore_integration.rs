// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Set FIRESTORE_EMULATOR_HOST to run them; otherwise they are skipped.

use trac_cal::models::UserProfile;

mod common;
use common::{sample_profile, test_db, test_db_offline};

/// Generate a unique user id for test isolation.
fn unique_user_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-user-{}", nanos)
}

#[tokio::test]
async fn test_offline_db_reports_errors() {
    let db = test_db_offline();

    assert!(db.get_profile("anyone").await.is_err());
    assert!(db
        .upsert_profile("anyone", &UserProfile::default())
        .await
        .is_err());
}

#[tokio::test]
async fn test_profile_roundtrip() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    let before = db.get_profile(&user_id).await.unwrap();
    assert!(before.is_none(), "Profile should not exist before creation");

    let profile = sample_profile().with_derived_goals();
    db.upsert_profile(&user_id, &profile).await.unwrap();

    let fetched = db.get_profile(&user_id).await.unwrap();
    assert_eq!(fetched, Some(profile));
}

#[tokio::test]
async fn test_profile_upsert_replaces() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    db.upsert_profile(&user_id, &sample_profile().with_derived_goals())
        .await
        .unwrap();

    let mut updated = sample_profile();
    updated.weight_kg = 72.0;
    let updated = updated.with_derived_goals();
    db.upsert_profile(&user_id, &updated).await.unwrap();

    let fetched = db.get_profile(&user_id).await.unwrap().unwrap();
    assert_eq!(fetched.weight_kg, 72.0);
    assert_eq!(fetched.daily_calorie_goal, updated.daily_calorie_goal);
}

#[tokio::test]
async fn test_profile_delete() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    db.upsert_profile(&user_id, &sample_profile().with_derived_goals())
        .await
        .unwrap();
    db.delete_profile(&user_id).await.unwrap();

    assert!(db.get_profile(&user_id).await.unwrap().is_none());
}
