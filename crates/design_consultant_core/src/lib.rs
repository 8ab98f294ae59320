pub mod domain;
pub mod ports;

pub use domain::{ChatMessage, Intent, RoomImage, Sender, Session, ShoppingItem, DESIGN_STYLES, GREETING};
pub use ports::{ChatAssistantService, GatewayError, GatewayResult, ImageGenerationService,
    KeyValueStore, ProductSuggestionService, StorageError, StorageResult};
