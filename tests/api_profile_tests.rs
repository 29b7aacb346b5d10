// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, food and key status endpoint tests (offline Firestore).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_jwt};

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn profile_body() -> Value {
    json!({
        "email": "alice@example.com",
        "age": 30,
        "gender": "male",
        "heightCm": 175.0,
        "weightKg": 75.0,
        "targetWeightKg": 70.0,
        "activityLevel": "moderate",
        "dailyCalorieGoal": 9999
    })
}

#[tokio::test]
async fn test_get_profile_defaults_when_nothing_saved() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    let (status, body) = send(&app, authed("GET", "/api/profile", &token, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "utilisateur@example.com");
    assert_eq!(body["dailyCalorieGoal"], 2000);
    assert_eq!(body["waterGoalMl"], 2000);
}

#[tokio::test]
async fn test_put_profile_recomputes_goals_and_reports_unsynced() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    let (status, body) = send(
        &app,
        authed("PUT", "/api/profile", &token, Some(profile_body())),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // Offline Firestore: the local save stands, replication is reported.
    assert_eq!(body["synced"], false);
    assert_eq!(body["profile"]["dailyCalorieGoal"], 2232);
    assert_eq!(body["profile"]["waterGoalMl"], 2700);
}

#[tokio::test]
async fn test_saved_profile_is_returned_by_get() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    send(
        &app,
        authed("PUT", "/api/profile", &token, Some(profile_body())),
    )
    .await;
    let (status, body) = send(&app, authed("GET", "/api/profile", &token, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["activityLevel"], "moderate");
    assert_eq!(body["dailyCalorieGoal"], 2232);
}

#[tokio::test]
async fn test_put_profile_rejects_unknown_activity_level() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    let mut body = profile_body();
    body["activityLevel"] = json!("extreme");

    let response = app
        .oneshot(authed("PUT", "/api/profile", &token, Some(body)))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_clear_local_profile() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    send(
        &app,
        authed("PUT", "/api/profile", &token, Some(profile_body())),
    )
    .await;
    let (status, body) = send(
        &app,
        authed("DELETE", "/api/profile/local", &token, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, authed("GET", "/api/profile", &token, None)).await;
    assert_eq!(body["email"], "utilisateur@example.com");
}

#[tokio::test]
async fn test_local_food_search() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    let (status, body) = send(
        &app,
        authed("GET", "/api/foods/local?q=POULET", &token, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let foods = body["foods"].as_array().unwrap();
    assert!(!foods.is_empty());
    assert!(foods.iter().all(|f| f["name"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("poulet")));
}

#[tokio::test]
async fn test_empty_food_query_is_bad_request() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    let (status, body) = send(
        &app,
        authed(
            "POST",
            "/api/foods/search",
            &token,
            Some(json!({ "query": "   " })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_invalid_image_is_bad_request() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    let (status, _) = send(
        &app,
        authed(
            "POST",
            "/api/foods/analyze",
            &token,
            Some(json!({ "image": "not base64 at all!" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unreachable_provider_is_bad_gateway_without_rotation() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    let (status, body) = send(
        &app,
        authed(
            "POST",
            "/api/foods/search",
            &token,
            Some(json!({ "query": "pomme" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "provider_error");

    // A transport failure is not a quota signal.
    let snapshot = state.nutrition_service.key_pool().snapshot().await;
    assert_eq!(snapshot.active_index, 0);
    assert_eq!(snapshot.exhausted_count(), 0);
}

#[tokio::test]
async fn test_key_status_masks_tokens() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("user-1", &state.config.jwt_signing_key);

    state
        .nutrition_service
        .key_pool()
        .mark_active_exhausted()
        .await
        .unwrap();

    let (status, body) = send(&app, authed("GET", "/api/keys/status", &token, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activeIndex"], 1);
    assert_eq!(body["exhausted"], 1);

    let keys = body["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 3);
    assert_eq!(keys[0]["token"], "****-one");
    assert_eq!(keys[0]["remainingQuota"], 0);
    assert_eq!(keys[1]["active"], true);
    assert!(!body.to_string().contains("sk-test"));
}

#[tokio::test]
async fn test_profiles_are_isolated_between_users() {
    let (app, state) = create_test_app();
    let alice = create_test_jwt("alice", &state.config.jwt_signing_key);
    let bob = create_test_jwt("bob", &state.config.jwt_signing_key);

    let mut body = profile_body();
    body["email"] = json!("alice@private.example");
    let (status, _) = send(&app, authed("PUT", "/api/profile", &alice, Some(body))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, authed("GET", "/api/profile", &bob, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "utilisateur@example.com");

    // Clearing Bob's copy leaves Alice's alone.
    send(&app, authed("DELETE", "/api/profile/local", &bob, None)).await;
    let (_, body) = send(&app, authed("GET", "/api/profile", &alice, None)).await;
    assert_eq!(body["email"], "alice@private.example");
}
