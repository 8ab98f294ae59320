//! services/studio/src/app/intent.rs
//!
//! The intent router: the one classification path that is never allowed to
//! fail outward.

use design_consultant_core::domain::Intent;
use design_consultant_core::ports::ChatAssistantService;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes a free-text message to visual, shopping, or general handling. Any
/// classifier failure degrades to `General`: a misrouted general question must
/// never trigger a costly image edit, while a misrouted visual request merely
/// gets a less useful conversational reply.
#[derive(Clone)]
pub struct IntentRouter {
    chat: Arc<dyn ChatAssistantService>,
}

impl IntentRouter {
    pub fn new(chat: Arc<dyn ChatAssistantService>) -> Self {
        Self { chat }
    }

    /// Classifies `text`. Infallible by contract.
    pub async fn route(&self, text: &str) -> Intent {
        match self.chat.classify_intent(text).await {
            Ok(intent) => {
                debug!("Message classified as '{}'", intent.as_str());
                intent
            }
            Err(err) => {
                warn!("Intent classification failed, defaulting to 'general': {err}");
                Intent::General
            }
        }
    }
}
