//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Directory holding the device-local store
    pub data_dir: PathBuf,
    /// Base URL of the OpenAI-compatible API
    pub openai_base_url: String,
    /// Model used for text food lookups
    pub openai_text_model: String,
    /// Model used for food image analysis
    pub openai_vision_model: String,

    // --- Secrets ---
    /// API keys for the nutrition provider, in rotation order
    pub openai_api_keys: Vec<String>,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let openai_api_keys = parse_api_keys(
            &env::var("OPENAI_API_KEYS").map_err(|_| ConfigError::Missing("OPENAI_API_KEYS"))?,
        );
        if openai_api_keys.is_empty() {
            return Err(ConfigError::Invalid(
                "OPENAI_API_KEYS",
                "no keys after splitting on commas".to_string(),
            ));
        }

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| ConfigError::Invalid("PORT", format!("{}", e)))?,
            Err(_) => 8080,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_text_model: env::var("OPENAI_TEXT_MODEL")
                .unwrap_or_else(|_| "gpt-4".to_string()),
            openai_vision_model: env::var("OPENAI_VISION_MODEL")
                .unwrap_or_else(|_| "gpt-4-vision-preview".to_string()),

            openai_api_keys,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Config for tests: no network, local store under the temp dir.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:8081".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            data_dir: env::temp_dir().join("trac-cal-test"),
            openai_base_url: "http://127.0.0.1:9".to_string(),
            openai_text_model: "gpt-4".to_string(),
            openai_vision_model: "gpt-4-vision-preview".to_string(),
            openai_api_keys: vec![
                "sk-test-one".to_string(),
                "sk-test-two".to_string(),
                "sk-test-three".to_string(),
            ],
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Path of the local key-value store file.
    pub fn local_store_path(&self) -> PathBuf {
        self.data_dir.join("local_store.json")
    }
}

/// Split a comma-separated key list, dropping blanks.
pub fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
