//! services/studio/src/app/controller.rs
//!
//! The interaction controller: consumes user commands, drives the intent
//! router and the model gateway, owns the session state and the single
//! in-flight request latch, and answers every command with a fresh snapshot.

use crate::app::intent::IntentRouter;
use crate::app::protocol::{Command, SessionView, Snapshot};
use crate::app::shopping_list::ShoppingListStore;
use crate::app::state::{ControllerState, RequestLatch};
use design_consultant_core::domain::{ChatMessage, Intent, RoomImage, Session, ShoppingItem};
use design_consultant_core::ports::{
    ChatAssistantService, GatewayError, ImageGenerationService, ProductSuggestionService,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

//=========================================================================================
// Status and Confirmation Copy
//=========================================================================================

const STATUS_THINKING: &str = "Thinking...";
const STATUS_APPLYING_EDIT: &str = "Applying your changes to the image...";
const STATUS_SEARCHING_PRODUCTS: &str = "Searching for product ideas...";
const STATUS_CREATING_VISION: &str = "Creating your vision...";

const EDIT_CONFIRMATION: &str = "Done! What do you think of this version?";
const SUGGESTION_LEAD_IN: &str = "Here are a few ideas I found:";
const EMPTY_DESCRIPTION_ERROR: &str = "Please enter a description.";

fn restyle_status(style: &str) -> String {
    format!("Reimagining your room in a {style} style...")
}

/// The full edit instruction a one-click restyle sends to the image model.
fn restyle_instruction(style: &str) -> String {
    format!(
        "Reimagine this entire room in a {style} interior design style. Maintain the \
         original room layout and architecture but change the furniture, colors, \
         lighting, and decor to fit the style."
    )
}

fn restyle_confirmation(style: &str) -> String {
    format!(
        "Here's a {style} version of your room! You can use the slider to compare. \
         What do you think? Feel free to ask for changes."
    )
}

/// What a routed chat request produced. Exactly one AI turn lands per
/// submission, mirroring one of these.
enum ChatOutcome {
    Generated(RoomImage),
    Suggestions(Vec<ShoppingItem>),
    Reply(String),
    Failed(GatewayError),
}

//=========================================================================================
// The Controller
//=========================================================================================

/// The root orchestrator. Owns the session state and the shopping list
/// exclusively; every mutation flows through `handle`.
pub struct InteractionController {
    images: Arc<dyn ImageGenerationService>,
    products: Arc<dyn ProductSuggestionService>,
    chat: Arc<dyn ChatAssistantService>,
    router: IntentRouter,
    state: Mutex<ControllerState>,
    shopping_list: Mutex<ShoppingListStore>,
    latch: RequestLatch,
}

impl InteractionController {
    /// Creates a controller over the injected ports and a (possibly restored)
    /// shopping list.
    pub fn new(
        images: Arc<dyn ImageGenerationService>,
        products: Arc<dyn ProductSuggestionService>,
        chat: Arc<dyn ChatAssistantService>,
        shopping_list: ShoppingListStore,
    ) -> Self {
        Self {
            images,
            products,
            router: IntentRouter::new(chat.clone()),
            chat,
            state: Mutex::new(ControllerState::default()),
            shopping_list: Mutex::new(shopping_list),
            latch: RequestLatch::new(),
        }
    }

    /// Applies one user command and returns the resulting snapshot.
    pub async fn handle(&self, command: Command) -> Snapshot {
        match command {
            Command::StartSession { image } => self.start_session(image).await,
            Command::ApplyStyle { style } => self.apply_style(&style).await,
            Command::SendMessage { text } => self.submit_chat_message(&text).await,
            Command::RevertTo { image } => self.revert_to(image).await,
            Command::GenerateInspiration { description } => {
                self.generate_inspiration(&description).await
            }
            Command::AddToShoppingList { item } => {
                self.shopping_list.lock().await.add(item).await;
                self.snapshot().await
            }
            Command::RemoveFromShoppingList { url } => {
                self.shopping_list.lock().await.remove(&url).await;
                self.snapshot().await
            }
            Command::ClearShoppingList => {
                self.shopping_list.lock().await.clear().await;
                self.snapshot().await
            }
        }
    }

    /// The current state as an immutable view. Callable at any time,
    /// including while a request is in flight.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;
        let shopping_list = self.shopping_list.lock().await;
        Snapshot {
            session: state.session.as_ref().map(SessionView::from),
            shopping_list: shopping_list.items().to_vec(),
            busy: self.latch.is_busy(),
            status: state.status.clone(),
            last_error: state.last_error.clone(),
            inspiration: state.inspiration.clone(),
        }
    }

    //-------------------------------------------------------------------------------------
    // Session lifecycle
    //-------------------------------------------------------------------------------------

    async fn start_session(&self, image: RoomImage) -> Snapshot {
        {
            let mut state = self.state.lock().await;
            let session = Session::start(image);
            info!("Session {} started.", session.id);
            state.session = Some(session);
        }
        self.snapshot().await
    }

    async fn revert_to(&self, image: RoomImage) -> Snapshot {
        {
            let mut state = self.state.lock().await;
            match state.session.as_mut() {
                Some(session) => session.revert_to(image),
                None => warn!("Ignoring revert: no session yet."),
            }
        }
        self.snapshot().await
    }

    //-------------------------------------------------------------------------------------
    // Request-issuing operations (guarded by the latch)
    //-------------------------------------------------------------------------------------

    async fn apply_style(&self, style: &str) -> Snapshot {
        if !self.latch.try_begin() {
            warn!("Ignoring style '{}': a request is already in flight.", style);
            return self.snapshot().await;
        }

        // Styles always restyle the uploaded photo, not the latest redesign.
        let base = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            let base = state.session.as_ref().map(|session| session.original.clone());
            if base.is_some() {
                state.last_error = None;
                state.status = Some(restyle_status(style));
            }
            base
        };
        let Some(base) = base else {
            self.latch.finish();
            warn!("Ignoring style '{}': no session yet.", style);
            return self.snapshot().await;
        };

        info!("Applying style '{}'.", style);
        let outcome = self.images.edit_image(&base, &restyle_instruction(style)).await;

        {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            match outcome {
                Ok(image) => {
                    info!("Style '{}' applied.", style);
                    if let Some(session) = state.session.as_mut() {
                        session.record_generation(image);
                        session.push_turn(ChatMessage::ai(restyle_confirmation(style)));
                    }
                }
                Err(err) => Self::record_failure(state, &err),
            }
            state.status = None;
        }
        self.latch.finish();
        self.snapshot().await
    }

    async fn submit_chat_message(&self, text: &str) -> Snapshot {
        let text = text.trim();
        if text.is_empty() {
            return self.snapshot().await;
        }
        if !self.latch.try_begin() {
            warn!("Ignoring chat message: a request is already in flight.");
            return self.snapshot().await;
        }

        // The user turn lands before classification, so the transcript shows
        // the request even when handling fails later.
        let base = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            match state.session.as_mut() {
                Some(session) => {
                    session.push_turn(ChatMessage::user(text));
                    state.last_error = None;
                    state.status = Some(STATUS_THINKING.to_string());
                    Some(session.edit_base().clone())
                }
                None => None,
            }
        };
        let Some(base) = base else {
            self.latch.finish();
            warn!("Ignoring chat message: no session yet.");
            return self.snapshot().await;
        };

        let intent = self.router.route(text).await;
        info!("Handling chat message as '{}'.", intent.as_str());

        let outcome = match intent {
            Intent::Visual => {
                self.set_status(STATUS_APPLYING_EDIT).await;
                match self.images.edit_image(&base, text).await {
                    Ok(image) => ChatOutcome::Generated(image),
                    Err(err) => ChatOutcome::Failed(err),
                }
            }
            Intent::Shopping => {
                self.set_status(STATUS_SEARCHING_PRODUCTS).await;
                match self.products.suggest_products(text).await {
                    Ok(items) => ChatOutcome::Suggestions(items),
                    Err(err) => ChatOutcome::Failed(err),
                }
            }
            Intent::General => match self.chat.general_reply(text).await {
                Ok(reply) => ChatOutcome::Reply(reply),
                Err(err) => ChatOutcome::Failed(err),
            },
        };

        {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            match outcome {
                ChatOutcome::Generated(image) => {
                    if let Some(session) = state.session.as_mut() {
                        session.record_generation(image);
                        session.push_turn(ChatMessage::ai(EDIT_CONFIRMATION));
                    }
                }
                ChatOutcome::Suggestions(items) => {
                    info!("Returning {} product suggestions.", items.len());
                    if let Some(session) = state.session.as_mut() {
                        session.push_turn(ChatMessage::ai_with_items(SUGGESTION_LEAD_IN, items));
                    }
                }
                ChatOutcome::Reply(reply) => {
                    if let Some(session) = state.session.as_mut() {
                        session.push_turn(ChatMessage::ai(reply));
                    }
                }
                ChatOutcome::Failed(err) => Self::record_failure(state, &err),
            }
            state.status = None;
        }
        self.latch.finish();
        self.snapshot().await
    }

    async fn generate_inspiration(&self, description: &str) -> Snapshot {
        let description = description.trim();
        if description.is_empty() {
            self.state.lock().await.last_error = Some(EMPTY_DESCRIPTION_ERROR.to_string());
            return self.snapshot().await;
        }
        if !self.latch.try_begin() {
            warn!("Ignoring inspiration request: a request is already in flight.");
            return self.snapshot().await;
        }

        {
            let mut state = self.state.lock().await;
            state.last_error = None;
            state.inspiration = None;
            state.status = Some(STATUS_CREATING_VISION.to_string());
        }

        info!("Generating inspiration for '{}'.", description);
        let outcome = self.images.generate_from_text(description).await;

        {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            match outcome {
                Ok(image) => state.inspiration = Some(image),
                Err(err) => {
                    // Banner only. Inspiration runs outside any conversation,
                    // so no transcript turn is written.
                    error!("Inspiration request failed: {err}");
                    state.last_error = Some(err.to_string());
                }
            }
            state.status = None;
        }
        self.latch.finish();
        self.snapshot().await
    }

    //-------------------------------------------------------------------------------------
    // Helpers
    //-------------------------------------------------------------------------------------

    async fn set_status(&self, status: &str) {
        self.state.lock().await.status = Some(status.to_string());
    }

    /// Folds a Gateway failure into the state: the banner always, plus an AI
    /// turn repeating the message when a conversation exists to carry it.
    fn record_failure(state: &mut ControllerState, err: &GatewayError) {
        error!("Gateway call failed: {err}");
        let message = err.to_string();
        if let Some(session) = state.session.as_mut() {
            session.push_turn(ChatMessage::ai(message.clone()));
        }
        state.last_error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::JsonFileStore;
    use async_trait::async_trait;
    use design_consultant_core::domain::{Sender, GREETING};
    use design_consultant_core::ports::GatewayResult;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::Semaphore;

    //-------------------------------------------------------------------------------------
    // Scriptable gateway standing in for all three model ports
    //-------------------------------------------------------------------------------------

    #[derive(Default)]
    struct MockGateway {
        edit_results: StdMutex<VecDeque<GatewayResult<RoomImage>>>,
        generate_results: StdMutex<VecDeque<GatewayResult<RoomImage>>>,
        suggest_results: StdMutex<VecDeque<GatewayResult<Vec<ShoppingItem>>>>,
        classify_results: StdMutex<VecDeque<GatewayResult<Intent>>>,
        reply_results: StdMutex<VecDeque<GatewayResult<String>>>,
        edit_bases: StdMutex<Vec<RoomImage>>,
        edit_instructions: StdMutex<Vec<String>>,
        edit_calls: AtomicUsize,
        generate_calls: AtomicUsize,
        classify_calls: AtomicUsize,
        /// When set, edit calls park here until the test releases a permit.
        hold_edits: Option<Arc<Semaphore>>,
    }

    impl MockGateway {
        fn queue_edit(&self, result: GatewayResult<RoomImage>) {
            self.edit_results.lock().unwrap().push_back(result);
        }

        fn queue_generate(&self, result: GatewayResult<RoomImage>) {
            self.generate_results.lock().unwrap().push_back(result);
        }

        fn queue_suggest(&self, result: GatewayResult<Vec<ShoppingItem>>) {
            self.suggest_results.lock().unwrap().push_back(result);
        }

        fn queue_classify(&self, result: GatewayResult<Intent>) {
            self.classify_results.lock().unwrap().push_back(result);
        }

        fn queue_reply(&self, result: GatewayResult<String>) {
            self.reply_results.lock().unwrap().push_back(result);
        }
    }

    #[async_trait]
    impl ImageGenerationService for MockGateway {
        async fn edit_image(
            &self,
            base: &RoomImage,
            instruction: &str,
        ) -> GatewayResult<RoomImage> {
            self.edit_calls.fetch_add(1, Ordering::SeqCst);
            self.edit_bases.lock().unwrap().push(base.clone());
            self.edit_instructions
                .lock()
                .unwrap()
                .push(instruction.to_string());
            if let Some(hold) = &self.hold_edits {
                let _permit = hold.acquire().await.unwrap();
            }
            self.edit_results.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(GatewayError::GenerationFailed("unscripted edit call".to_string()))
            })
        }

        async fn generate_from_text(&self, _description: &str) -> GatewayResult<RoomImage> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            self.generate_results.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(GatewayError::GenerationFailed("unscripted generate call".to_string()))
            })
        }
    }

    #[async_trait]
    impl ProductSuggestionService for MockGateway {
        async fn suggest_products(&self, _request: &str) -> GatewayResult<Vec<ShoppingItem>> {
            self.suggest_results.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(GatewayError::SuggestionFailed("unscripted suggest call".to_string()))
            })
        }
    }

    #[async_trait]
    impl ChatAssistantService for MockGateway {
        async fn classify_intent(&self, _text: &str) -> GatewayResult<Intent> {
            self.classify_calls.fetch_add(1, Ordering::SeqCst);
            self.classify_results.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(GatewayError::ChatFailed("unscripted classify call".to_string()))
            })
        }

        async fn general_reply(&self, _text: &str) -> GatewayResult<String> {
            self.reply_results.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(GatewayError::ChatFailed("unscripted reply call".to_string()))
            })
        }
    }

    //-------------------------------------------------------------------------------------
    // Test helpers
    //-------------------------------------------------------------------------------------

    fn img(tag: &str) -> RoomImage {
        RoomImage::new(tag.as_bytes().to_vec(), "image/png")
    }

    fn item(url: &str) -> ShoppingItem {
        ShoppingItem {
            name: format!("Item at {url}"),
            description: "A product.".to_string(),
            url: url.to_string(),
        }
    }

    async fn controller_with(mock: Arc<MockGateway>, dir: &TempDir) -> InteractionController {
        let storage = Arc::new(JsonFileStore::new(dir.path()));
        let list = ShoppingListStore::restore(storage).await;
        InteractionController::new(mock.clone(), mock.clone(), mock, list)
    }

    async fn started(mock: Arc<MockGateway>, dir: &TempDir) -> InteractionController {
        let controller = controller_with(mock, dir).await;
        controller
            .handle(Command::StartSession { image: img("upload") })
            .await;
        controller
    }

    fn transcript_texts(snapshot: &Snapshot) -> Vec<String> {
        snapshot
            .session
            .as_ref()
            .map(|session| {
                session
                    .transcript
                    .iter()
                    .map(|turn| turn.text.clone().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }

    //-------------------------------------------------------------------------------------
    // Tests
    //-------------------------------------------------------------------------------------

    #[tokio::test]
    async fn starting_a_session_opens_with_the_greeting() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        let controller = controller_with(mock, &dir).await;

        let snapshot = controller
            .handle(Command::StartSession { image: img("upload") })
            .await;

        let session = snapshot.session.unwrap();
        assert_eq!(session.original, img("upload"));
        assert!(session.current.is_none());
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.transcript[0].sender, Sender::Ai);
        assert_eq!(session.transcript[0].text.as_deref(), Some(GREETING));
        assert!(!snapshot.busy);
    }

    #[tokio::test]
    async fn a_new_upload_replaces_the_previous_session_wholesale() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_edit(Ok(img("v1")));
        let controller = started(mock, &dir).await;
        controller
            .handle(Command::ApplyStyle { style: "Coastal".to_string() })
            .await;

        let snapshot = controller
            .handle(Command::StartSession { image: img("second-upload") })
            .await;

        let session = snapshot.session.unwrap();
        assert_eq!(session.original, img("second-upload"));
        assert!(session.current.is_none());
        assert!(session.history.is_empty());
        assert_eq!(session.transcript.len(), 1);
    }

    #[tokio::test]
    async fn applying_a_style_records_the_redesign_and_confirms_in_chat() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_edit(Ok(img("scandi")));
        let controller = started(mock.clone(), &dir).await;

        let snapshot = controller
            .handle(Command::ApplyStyle { style: "Scandinavian".to_string() })
            .await;

        let session = snapshot.session.unwrap();
        assert_eq!(session.current, Some(img("scandi")));
        assert_eq!(session.history, vec![img("scandi")]);
        assert_eq!(session.transcript.len(), 2);
        assert_eq!(session.transcript[1].sender, Sender::Ai);
        let confirmation = session.transcript[1].text.as_deref().unwrap();
        assert!(confirmation.contains("Scandinavian"));
        assert!(snapshot.last_error.is_none());
        assert!(snapshot.status.is_none());
        assert!(!snapshot.busy);

        // The instruction sent to the model names the style; the base was the
        // uploaded photo.
        let instructions = mock.edit_instructions.lock().unwrap();
        assert!(instructions[0].contains("Scandinavian interior design style"));
        assert_eq!(mock.edit_bases.lock().unwrap()[0], img("upload"));
    }

    #[tokio::test]
    async fn styles_always_restyle_the_original_photo() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_edit(Ok(img("v1")));
        mock.queue_edit(Ok(img("v2")));
        let controller = started(mock.clone(), &dir).await;

        controller
            .handle(Command::ApplyStyle { style: "Coastal".to_string() })
            .await;
        let snapshot = controller
            .handle(Command::ApplyStyle { style: "Industrial".to_string() })
            .await;

        let bases = mock.edit_bases.lock().unwrap();
        assert_eq!(bases[0], img("upload"));
        assert_eq!(bases[1], img("upload"));
        let session = snapshot.session.unwrap();
        assert_eq!(session.current, Some(img("v2")));
        assert_eq!(session.history, vec![img("v1"), img("v2")]);
    }

    #[tokio::test]
    async fn a_failed_style_keeps_the_previous_design_and_reports_the_error() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_edit(Ok(img("v1")));
        mock.queue_edit(Err(GatewayError::GenerationFailed("boom".to_string())));
        let controller = started(mock, &dir).await;

        controller
            .handle(Command::ApplyStyle { style: "Coastal".to_string() })
            .await;
        let snapshot = controller
            .handle(Command::ApplyStyle { style: "Baroque".to_string() })
            .await;

        let expected = GatewayError::GenerationFailed("boom".to_string()).to_string();
        assert_eq!(snapshot.last_error.as_deref(), Some(expected.as_str()));
        let session = snapshot.session.unwrap();
        assert_eq!(session.current, Some(img("v1")));
        assert_eq!(session.history, vec![img("v1")]);
        assert_eq!(session.transcript.last().unwrap().text.as_deref(), Some(expected.as_str()));
        assert!(!snapshot.busy);
        assert!(snapshot.status.is_none());
    }

    #[tokio::test]
    async fn the_next_request_clears_the_error_banner() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_edit(Err(GatewayError::GenerationFailed("boom".to_string())));
        mock.queue_edit(Ok(img("v1")));
        let controller = started(mock, &dir).await;

        let failed = controller
            .handle(Command::ApplyStyle { style: "Coastal".to_string() })
            .await;
        assert!(failed.last_error.is_some());

        let recovered = controller
            .handle(Command::ApplyStyle { style: "Coastal".to_string() })
            .await;
        assert!(recovered.last_error.is_none());
        assert_eq!(recovered.session.unwrap().current, Some(img("v1")));
    }

    #[tokio::test]
    async fn shopping_messages_append_one_suggestion_turn() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_classify(Ok(Intent::Shopping));
        mock.queue_suggest(Ok(vec![
            item("https://shop.example/rug"),
            item("https://shop.example/lamp"),
            item("https://shop.example/throw"),
        ]));
        let controller = started(mock, &dir).await;

        let snapshot = controller
            .handle(Command::SendMessage { text: "Find me a blue rug".to_string() })
            .await;

        let session = snapshot.session.unwrap();
        assert_eq!(session.transcript.len(), 3);
        assert_eq!(session.transcript[1].sender, Sender::User);
        assert_eq!(session.transcript[1].text.as_deref(), Some("Find me a blue rug"));
        let suggestions = session.transcript[2].items.as_ref().unwrap();
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions.iter().all(|s| !s.name.is_empty() && !s.url.is_empty()));
        // Suggestions are offers, not purchases: the list is untouched.
        assert!(snapshot.shopping_list.is_empty());
        assert!(session.current.is_none());
    }

    #[tokio::test]
    async fn visual_messages_edit_the_latest_redesign() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_edit(Ok(img("v1")));
        mock.queue_classify(Ok(Intent::Visual));
        mock.queue_edit(Ok(img("v2")));
        let controller = started(mock.clone(), &dir).await;

        controller
            .handle(Command::ApplyStyle { style: "Coastal".to_string() })
            .await;
        let snapshot = controller
            .handle(Command::SendMessage { text: "add more plants".to_string() })
            .await;

        // The chat edit starts from the redesign, not the upload.
        let bases = mock.edit_bases.lock().unwrap();
        assert_eq!(bases[0], img("upload"));
        assert_eq!(bases[1], img("v1"));
        assert_eq!(mock.edit_instructions.lock().unwrap()[1], "add more plants");

        let session = snapshot.session.unwrap();
        assert_eq!(session.current, Some(img("v2")));
        assert_eq!(session.history, vec![img("v1"), img("v2")]);
        assert_eq!(
            session.transcript.last().unwrap().text.as_deref(),
            Some(EDIT_CONFIRMATION)
        );
    }

    #[tokio::test]
    async fn general_messages_get_a_conversational_reply() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_classify(Ok(Intent::General));
        mock.queue_reply(Ok("Japandi blends Japanese and Scandinavian design.".to_string()));
        let controller = started(mock, &dir).await;

        let snapshot = controller
            .handle(Command::SendMessage { text: "What is Japandi?".to_string() })
            .await;

        let texts = transcript_texts(&snapshot);
        assert_eq!(
            texts.last().map(String::as_str),
            Some("Japandi blends Japanese and Scandinavian design.")
        );
        let session = snapshot.session.unwrap();
        assert!(session.current.is_none());
    }

    #[tokio::test]
    async fn classifier_failures_fall_back_to_a_general_reply() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_classify(Err(GatewayError::ChatFailed("offline".to_string())));
        mock.queue_reply(Ok("Happy to help!".to_string()));
        let controller = started(mock.clone(), &dir).await;

        let snapshot = controller
            .handle(Command::SendMessage { text: "hello there".to_string() })
            .await;

        assert_eq!(mock.edit_calls.load(Ordering::SeqCst), 0);
        let texts = transcript_texts(&snapshot);
        assert_eq!(texts.last().map(String::as_str), Some("Happy to help!"));
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn a_failed_chat_edit_reports_through_banner_and_transcript() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_edit(Ok(img("v1")));
        mock.queue_classify(Ok(Intent::Visual));
        mock.queue_edit(Err(GatewayError::GenerationFailed(
            "the model returned no image content; it may have refused the prompt".to_string(),
        )));
        let controller = started(mock, &dir).await;

        controller
            .handle(Command::ApplyStyle { style: "Coastal".to_string() })
            .await;
        let snapshot = controller
            .handle(Command::SendMessage { text: "make it warmer".to_string() })
            .await;

        let session = snapshot.session.unwrap();
        // The failed edit left the working image alone.
        assert_eq!(session.current, Some(img("v1")));
        assert_eq!(session.history, vec![img("v1")]);

        let error_text = snapshot.last_error.unwrap();
        assert!(error_text.starts_with("Failed to generate image:"));
        let last_turn = session.transcript.last().unwrap();
        assert_eq!(last_turn.sender, Sender::Ai);
        assert_eq!(last_turn.text.as_deref(), Some(error_text.as_str()));
        assert!(!snapshot.busy);
    }

    #[tokio::test]
    async fn empty_chat_messages_are_ignored() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        let controller = started(mock.clone(), &dir).await;

        let snapshot = controller
            .handle(Command::SendMessage { text: "   \n".to_string() })
            .await;

        assert_eq!(snapshot.session.unwrap().transcript.len(), 1);
        assert_eq!(mock.classify_calls.load(Ordering::SeqCst), 0);
        assert!(!snapshot.busy);
    }

    #[tokio::test]
    async fn requests_without_a_session_are_logged_no_ops() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        let controller = controller_with(mock.clone(), &dir).await;

        let snapshot = controller
            .handle(Command::ApplyStyle { style: "Coastal".to_string() })
            .await;
        assert!(snapshot.session.is_none());

        let snapshot = controller
            .handle(Command::SendMessage { text: "hello".to_string() })
            .await;
        assert!(snapshot.session.is_none());

        let snapshot = controller
            .handle(Command::RevertTo { image: img("x") })
            .await;
        assert!(snapshot.session.is_none());

        assert_eq!(mock.edit_calls.load(Ordering::SeqCst), 0);
        assert_eq!(mock.classify_calls.load(Ordering::SeqCst), 0);
        assert!(!snapshot.busy);
    }

    #[tokio::test]
    async fn reverting_restores_an_earlier_design_without_touching_the_chat() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_edit(Ok(img("v1")));
        mock.queue_classify(Ok(Intent::Visual));
        mock.queue_edit(Ok(img("v2")));
        let controller = started(mock, &dir).await;

        controller
            .handle(Command::ApplyStyle { style: "Coastal".to_string() })
            .await;
        let before = controller
            .handle(Command::SendMessage { text: "add plants".to_string() })
            .await;
        let turns_before = before.session.unwrap().transcript.len();

        let snapshot = controller.handle(Command::RevertTo { image: img("v1") }).await;

        let session = snapshot.session.unwrap();
        assert_eq!(session.current, Some(img("v1")));
        assert_eq!(session.history, vec![img("v1"), img("v2")]);
        assert_eq!(session.transcript.len(), turns_before);
    }

    #[tokio::test]
    async fn overlapping_requests_are_rejected_not_queued() {
        let dir = TempDir::new().unwrap();
        let hold = Arc::new(Semaphore::new(0));
        let mock = Arc::new(MockGateway {
            hold_edits: Some(hold.clone()),
            ..MockGateway::default()
        });
        mock.queue_edit(Ok(img("v1")));
        let controller = Arc::new(started(mock.clone(), &dir).await);

        let background = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller
                    .handle(Command::ApplyStyle { style: "Scandinavian".to_string() })
                    .await
            })
        };

        // Wait until the first request is inside the gateway call.
        let mut waited = 0;
        while !controller.snapshot().await.busy {
            tokio::time::sleep(Duration::from_millis(2)).await;
            waited += 1;
            assert!(waited < 500, "the first request never became busy");
        }
        let mid_flight = controller.snapshot().await;
        assert_eq!(
            mid_flight.status.as_deref(),
            Some("Reimagining your room in a Scandinavian style...")
        );

        // A second style while busy is dropped without reaching the gateway.
        let rejected = controller
            .handle(Command::ApplyStyle { style: "Industrial".to_string() })
            .await;
        assert!(rejected.busy);

        // So is a chat message; the user turn is not even recorded.
        let rejected_chat = controller
            .handle(Command::SendMessage { text: "add plants".to_string() })
            .await;
        assert_eq!(rejected_chat.session.unwrap().transcript.len(), 1);

        // Shopping-list edits are not requests and still go through.
        let list_edit = controller
            .handle(Command::AddToShoppingList { item: item("https://shop.example/lamp") })
            .await;
        assert_eq!(list_edit.shopping_list.len(), 1);
        assert!(list_edit.busy);

        hold.add_permits(1);
        let final_snapshot = background.await.unwrap();

        assert_eq!(mock.edit_calls.load(Ordering::SeqCst), 1);
        assert!(!final_snapshot.busy);
        let session = final_snapshot.session.unwrap();
        assert_eq!(session.current, Some(img("v1")));
        // Exactly one confirmation turn: the rejected requests left no trace.
        assert_eq!(session.transcript.len(), 2);
        assert_eq!(mock.classify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn inspiration_renders_into_its_own_slot() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        mock.queue_generate(Ok(img("concept")));
        let controller = controller_with(mock.clone(), &dir).await;

        // Works without any session.
        let snapshot = controller
            .handle(Command::GenerateInspiration {
                description: "a cozy reading nook".to_string(),
            })
            .await;
        assert_eq!(snapshot.inspiration, Some(img("concept")));
        assert!(snapshot.session.is_none());
        assert!(!snapshot.busy);

        // A failure clears the slot and sets the banner, no transcript involved.
        mock.queue_generate(Err(GatewayError::GenerationFailed("boom".to_string())));
        let failed = controller
            .handle(Command::GenerateInspiration {
                description: "a brutalist kitchen".to_string(),
            })
            .await;
        assert!(failed.inspiration.is_none());
        assert!(failed.last_error.is_some());
        assert_eq!(mock.generate_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn blank_inspiration_descriptions_ask_for_input() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        let controller = controller_with(mock.clone(), &dir).await;

        let snapshot = controller
            .handle(Command::GenerateInspiration { description: "  ".to_string() })
            .await;

        assert_eq!(snapshot.last_error.as_deref(), Some(EMPTY_DESCRIPTION_ERROR));
        assert_eq!(mock.generate_calls.load(Ordering::SeqCst), 0);
        assert!(!snapshot.busy);
    }

    #[tokio::test]
    async fn shopping_list_commands_mutate_and_persist_the_list() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockGateway::default());
        let controller = controller_with(mock.clone(), &dir).await;

        let snapshot = controller
            .handle(Command::AddToShoppingList { item: item("https://shop.example/rug") })
            .await;
        assert_eq!(snapshot.shopping_list.len(), 1);

        let snapshot = controller
            .handle(Command::AddToShoppingList { item: item("https://shop.example/rug") })
            .await;
        assert_eq!(snapshot.shopping_list.len(), 1);

        let snapshot = controller
            .handle(Command::AddToShoppingList { item: item("https://shop.example/lamp") })
            .await;
        assert_eq!(snapshot.shopping_list.len(), 2);

        let snapshot = controller
            .handle(Command::RemoveFromShoppingList {
                url: "https://shop.example/rug".to_string(),
            })
            .await;
        assert_eq!(snapshot.shopping_list.len(), 1);
        assert_eq!(snapshot.shopping_list[0].url, "https://shop.example/lamp");

        // The surviving entry was written through to storage.
        let restored = ShoppingListStore::restore(Arc::new(JsonFileStore::new(dir.path()))).await;
        assert_eq!(restored.items().len(), 1);

        let snapshot = controller.handle(Command::ClearShoppingList).await;
        assert!(snapshot.shopping_list.is_empty());
    }
}
