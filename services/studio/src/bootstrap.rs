//! services/studio/src/bootstrap.rs
//!
//! Wires the concrete adapters into an `InteractionController`. The embedding
//! shell calls this once at startup, in place of a binary entry point.

use crate::adapters::{GeminiGateway, JsonFileStore};
use crate::app::{InteractionController, ShoppingListStore};
use crate::config::Config;
use crate::error::StudioError;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber at the configured level. Call at
/// most once, before `build`.
pub fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Builds the controller over the shipped adapters: the Gemini gateway for
/// all three model ports, JSON-file storage for the shopping list, and the
/// shopping list restored from disk.
pub async fn build(config: &Config) -> Result<InteractionController, StudioError> {
    // --- 1. Initialize the Gateway Adapter ---
    let client = reqwest::Client::builder().build()?;
    let gateway = Arc::new(GeminiGateway::new(
        client,
        config.gemini_api_key.clone(),
        config.api_base.clone(),
        config.image_model.clone(),
        config.text_model.clone(),
    ));
    if config.gemini_api_key.is_none() {
        // Deliberately not fatal: the first Gateway call reports it instead.
        info!("GEMINI_API_KEY is not set; model calls will fail until it is provided.");
    }

    // --- 2. Initialize Client Storage & Restore the Shopping List ---
    tokio::fs::create_dir_all(&config.storage_dir).await?;
    let storage = Arc::new(JsonFileStore::new(config.storage_dir.clone()));
    let shopping_list = ShoppingListStore::restore(storage).await;
    info!(
        "Client storage ready at '{}'; {} saved item(s) restored.",
        config.storage_dir.display(),
        shopping_list.items().len()
    );

    // --- 3. Assemble the Controller ---
    info!(
        "Studio assembled (image model: '{}', text model: '{}').",
        config.image_model, config.text_model
    );
    Ok(InteractionController::new(
        gateway.clone(),
        gateway.clone(),
        gateway,
        shopping_list,
    ))
}
