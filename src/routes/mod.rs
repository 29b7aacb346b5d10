// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.
//!
//! `/health` is public. Everything under `/api` (profile, food lookups and
//! key status) needs a session token; see [`api::routes`].

pub mod api;

use crate::middleware::auth::require_auth;
use crate::middleware::security::add_security_headers;
use crate::AppState;
use axum::http::{header, request::Parts, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub build_id: String,
}

/// Liveness probe for the load balancer and the app's offline banner.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
    })
}

/// Origins allowed to call the API with credentials: the configured web
/// app, plus local Expo / Metro dev servers.
fn is_allowed_origin(origin: &str, frontend_url: &str) -> bool {
    origin == frontend_url
        || origin.starts_with("http://localhost")
        || origin.starts_with("http://127.0.0.1")
}

fn cors_layer(frontend_url: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| is_allowed_origin(origin, &frontend_url))
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the complete router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.frontend_url.clone());

    let api_routes =
        api::routes().route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
