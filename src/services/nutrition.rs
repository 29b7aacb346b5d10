// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nutrition inference client (OpenAI-compatible chat completions).
//!
//! Handles:
//! - Food lookup from a free-text description
//! - Food recognition from a base64 JPEG
//! - Error classification for key rotation (429 / quota markers)
//! - Parsing the `{ "foods": [...] }` payload out of the model's reply

use crate::config::Config;
use crate::models::FoodSearchResponse;
use crate::services::key_pool::{KeyPool, ProviderError};
use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const MAX_TOKENS: u32 = 1000;
const REQUEST_TIMEOUT_SECS: u64 = 60;

const RESPONSE_FORMAT: &str = r#"Return the response in this exact JSON format: { "foods": [{ "name": "food name", "calories": number, "proteins": number, "carbs": number, "fats": number }] }. Calories should be per 100g, proteins/carbs/fats in grams per 100g. Be precise and realistic with the values."#;

/// Low-level client; every call takes the API key to use.
#[derive(Clone)]
pub struct NutritionClient {
    http: reqwest::Client,
    base_url: String,
    text_model: String,
    vision_model: String,
}

impl NutritionClient {
    pub fn new(base_url: String, text_model: String, vision_model: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed building nutrition HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            text_model,
            vision_model,
        })
    }

    /// Ask the model for nutrition facts about `query`.
    pub async fn search_food(
        &self,
        api_key: &str,
        query: &str,
    ) -> Result<FoodSearchResponse, ProviderError> {
        let body = json!({
            "model": self.text_model,
            "messages": [{
                "role": "user",
                "content": format!("Provide nutritional information for {}. {}", query, RESPONSE_FORMAT),
            }],
            "max_tokens": MAX_TOKENS,
        });

        self.chat_completion(api_key, &body).await
    }

    /// Ask the model to identify the foods in a base64-encoded JPEG.
    pub async fn analyze_food_image(
        &self,
        api_key: &str,
        base64_image: &str,
    ) -> Result<FoodSearchResponse, ProviderError> {
        let body = json!({
            "model": self.vision_model,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "text",
                        "text": format!("Analyze this food image and provide nutritional information. {}", RESPONSE_FORMAT),
                    },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/jpeg;base64,{}", base64_image) },
                    },
                ],
            }],
            "max_tokens": MAX_TOKENS,
        });

        self.chat_completion(api_key, &body).await
    }

    async fn chat_completion(
        &self,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<FoodSearchResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let completion: ChatCompletion = self.check_response_json(response).await?;
        parse_foods(completion)
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let err = ProviderError::from_status(status, body);
            if err.is_quota() {
                tracing::warn!(status, "Nutrition provider quota hit");
            }
            return Err(err);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("JSON parse error: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

fn parse_foods(completion: ChatCompletion) -> Result<FoodSearchResponse, ProviderError> {
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ProviderError::MalformedResponse("No response from provider".to_string()))?;

    parse_foods_content(&content)
}

/// Parse the model's message content, tolerating a Markdown code fence.
pub fn parse_foods_content(content: &str) -> Result<FoodSearchResponse, ProviderError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(json.trim())
        .map_err(|e| ProviderError::MalformedResponse(format!("Unexpected food payload: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// NutritionService - client plus key rotation
// ─────────────────────────────────────────────────────────────────────────────

/// High-level nutrition service: every call goes through the key pool.
#[derive(Clone)]
pub struct NutritionService {
    client: NutritionClient,
    key_pool: Arc<KeyPool>,
}

impl NutritionService {
    pub fn new(client: NutritionClient, key_pool: Arc<KeyPool>) -> Self {
        Self { client, key_pool }
    }

    /// Build the client from configuration.
    pub fn from_config(config: &Config, key_pool: Arc<KeyPool>) -> anyhow::Result<Self> {
        let client = NutritionClient::new(
            config.openai_base_url.clone(),
            config.openai_text_model.clone(),
            config.openai_vision_model.clone(),
        )?;
        Ok(Self::new(client, key_pool))
    }

    pub fn key_pool(&self) -> &KeyPool {
        &self.key_pool
    }

    /// Look up nutrition facts for a free-text food description.
    pub async fn search_food(&self, query: &str) -> crate::error::Result<FoodSearchResponse> {
        let client = &self.client;
        let foods = self
            .key_pool
            .invoke_default(|credential| async move {
                client.search_food(&credential.token, query).await
            })
            .await?;

        tracing::info!(results = foods.foods.len(), "Food search completed");
        Ok(foods)
    }

    /// Identify foods in a base64-encoded JPEG.
    pub async fn analyze_food_image(
        &self,
        base64_image: &str,
    ) -> crate::error::Result<FoodSearchResponse> {
        let client = &self.client;
        let foods = self
            .key_pool
            .invoke_default(|credential| async move {
                client.analyze_food_image(&credential.token, base64_image).await
            })
            .await?;

        tracing::info!(results = foods.foods.len(), "Food image analyzed");
        Ok(foods)
    }
}
