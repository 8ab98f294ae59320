//! services/studio/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use tracing::Level;

/// Endpoint the Gemini adapter posts `generateContent` requests to.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Optional by design: a missing key surfaces as a Gateway configuration
    /// error on the first model call, never as a startup failure.
    pub gemini_api_key: Option<String>,
    pub image_model: String,
    pub text_model: String,
    pub api_base: String,
    pub storage_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load API Key (as optional) ---
        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        // --- Load Gateway Settings ---
        let image_model = std::env::var("GEMINI_IMAGE_MODEL")
            .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string());
        let text_model =
            std::env::var("GEMINI_TEXT_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let api_base =
            std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        // --- Load Client Storage Settings ---
        let storage_dir = std::env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            gemini_api_key,
            image_model,
            text_model,
            api_base,
            storage_dir,
            log_level,
        })
    }
}
