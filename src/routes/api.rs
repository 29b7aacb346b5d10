// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{food, FoodSearchResponse, UserProfile};
use crate::time_utils::format_optional_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/profile/local", delete(clear_local_profile))
        .route("/api/foods/local", get(search_local_foods))
        .route("/api/foods/search", post(search_food))
        .route("/api/foods/analyze", post(analyze_food_image))
        .route("/api/keys/status", get(get_key_status))
}

// ─── User Profile ────────────────────────────────────────────

/// Profile response, with whether the remote copy is up to date.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub synced: bool,
}

/// Get the user's profile (cache, device store, Firestore, then default).
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<UserProfile> {
    let db = &state.db;
    let user_id = user.user_id.as_str();

    let profile = state
        .profile_store
        .get_profile(user_id, || async move { db.get_profile(user_id).await })
        .await;

    Json(profile)
}

/// Save the user's profile. Goals in the request body are ignored and
/// recomputed.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<ProfileResponse>> {
    let db = &state.db;
    let user_id = user.user_id.as_str();

    let outcome = state
        .profile_store
        .save_profile(user_id, profile, |saved| async move {
            db.upsert_profile(user_id, &saved).await
        })
        .await?;

    Ok(Json(ProfileResponse {
        synced: outcome.is_synced(),
        profile: outcome.profile,
    }))
}

/// Drop the local copy of the user's profile (sign-out).
async fn clear_local_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    state.profile_store.clear_local_profile(&user.user_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// ─── Foods ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct LocalFoodQuery {
    #[serde(default)]
    q: String,
}

/// Search the built-in food table.
async fn search_local_foods(Query(params): Query<LocalFoodQuery>) -> Json<FoodSearchResponse> {
    Json(FoodSearchResponse {
        foods: food::search_local_foods(&params.q),
    })
}

#[derive(Deserialize)]
struct FoodSearchRequest {
    query: String,
}

/// Ask the inference provider about a food description.
async fn search_food(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FoodSearchRequest>,
) -> Result<Json<FoodSearchResponse>> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }

    let foods = state.nutrition_service.search_food(query).await?;
    Ok(Json(foods))
}

#[derive(Deserialize)]
struct ImageAnalysisRequest {
    /// Base64-encoded JPEG
    image: String,
}

/// Ask the inference provider to identify foods in a photo.
async fn analyze_food_image(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImageAnalysisRequest>,
) -> Result<Json<FoodSearchResponse>> {
    let image = request.image.trim();
    if image.is_empty() || BASE64.decode(image).is_err() {
        return Err(AppError::BadRequest(
            "image must be base64-encoded".to_string(),
        ));
    }

    let foods = state.nutrition_service.analyze_food_image(image).await?;
    Ok(Json(foods))
}

// ─── API Key Status ──────────────────────────────────────────

/// One API key as shown to the client (token masked).
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatus {
    pub token: String,
    pub remaining_quota: u32,
    pub reset_time: Option<String>,
    pub active: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatusResponse {
    pub keys: Vec<KeyStatus>,
    pub active_index: usize,
    pub exhausted: usize,
}

/// Current key pool state, for diagnostics.
async fn get_key_status(State(state): State<Arc<AppState>>) -> Json<KeyStatusResponse> {
    let snapshot = state.nutrition_service.key_pool().snapshot().await;

    let keys = snapshot
        .credentials
        .iter()
        .enumerate()
        .map(|(idx, credential)| KeyStatus {
            token: credential.masked_token(),
            remaining_quota: credential.remaining_quota,
            reset_time: format_optional_rfc3339(credential.reset_time),
            active: idx == snapshot.active_index,
        })
        .collect();

    Json(KeyStatusResponse {
        keys,
        active_index: snapshot.active_index,
        exhausted: snapshot.exhausted_count(),
    })
}
