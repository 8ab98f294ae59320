//! crates/design_consultant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete generative-model API and of whatever storage
//! backs the shopping list.

use async_trait::async_trait;
use crate::domain::{Intent, RoomImage, ShoppingItem};

//=========================================================================================
// Gateway and Storage Error Types
//=========================================================================================

/// Failures crossing the generative-model boundary. The rendered messages are
/// shown to the user verbatim (error banner and chat turn), so they are written
/// for humans, not logs.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The model declined the prompt or produced no usable image.
    #[error("Failed to generate image: {0}")]
    GenerationFailed(String),
    /// Structured product data was missing or malformed.
    #[error("Failed to get shopping suggestions: {0}")]
    SuggestionFailed(String),
    /// A conversational call (classification or reply) failed in transport.
    #[error("Failed to get a chat response: {0}")]
    ChatFailed(String),
    /// Credentials are absent or unusable. Raised on first use, not at startup.
    #[error("Gateway configuration error: {0}")]
    Configuration(String),
}

/// A convenience type alias for `Result<T, GatewayError>`.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures in the client-scoped persistence behind the shopping list. These
/// are logged and tolerated; the in-memory list stays authoritative.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Re-renders `base` according to a natural-language instruction.
    async fn edit_image(&self, base: &RoomImage, instruction: &str) -> GatewayResult<RoomImage>;

    /// Renders a brand-new concept image from a text description alone.
    async fn generate_from_text(&self, description: &str) -> GatewayResult<RoomImage>;
}

#[async_trait]
pub trait ProductSuggestionService: Send + Sync {
    /// Returns suggested products for a shopping request. The backing prompt
    /// asks for three, but whatever count the model returns is passed through.
    async fn suggest_products(&self, request: &str) -> GatewayResult<Vec<ShoppingItem>>;
}

#[async_trait]
pub trait ChatAssistantService: Send + Sync {
    /// Classifies a message as visual, shopping, or general. Unrecognized
    /// labels are already `General` by the time they surface here; transport
    /// failures are `ChatFailed` and folded to `General` by the intent router.
    async fn classify_intent(&self, text: &str) -> GatewayResult<Intent>;

    /// Produces a free-form conversational reply.
    async fn general_reply(&self, text: &str) -> GatewayResult<String>;
}

/// Durable key-value storage scoped to the client, used for the shopping list.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Loads the serialized value for `key`; `None` when nothing was saved.
    async fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Persists `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes the persisted value for `key`. Absent keys are not an error.
    async fn clear(&self, key: &str) -> StorageResult<()>;
}
