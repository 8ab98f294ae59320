//! crates/design_consultant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Chat turns and shopping items cross the UI boundary and the persistence
//! boundary as JSON, so serde lives here rather than in a separate DTO layer.

use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// The named interior-design styles the UI offers as one-click restyles.
/// Advisory only: `apply_style` accepts any free-form style name.
pub const DESIGN_STYLES: &[&str] = &[
    "Mid-Century Modern",
    "Scandinavian",
    "Industrial",
    "Bohemian",
    "Coastal",
    "Minimalist",
    "Farmhouse",
    "Art Deco",
    "Modern Farmhouse",
    "Japandi",
    "Victorian",
    "Art Nouveau",
    "Shabby Chic",
    "Rustic",
    "Tropical",
    "Southwestern",
    "Eclectic",
];

/// The AI turn that opens every fresh session.
pub const GREETING: &str =
    "Great! I've got your image. What style are you envisioning for your space?";

/// An uploaded room photo or a generated redesign: raw bytes plus the media
/// type they were declared with. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomImage {
    pub data: Bytes,
    pub media_type: String,
}

impl RoomImage {
    pub fn new(data: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }

    /// Renders the image as a `data:` URI, the form the UI displays directly.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            general_purpose::STANDARD.encode(&self.data)
        )
    }

    /// Parses a `data:{media};base64,{payload}` URI back into an image.
    /// Returns `None` for anything that does not match that shape exactly.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (media_type, payload) = rest.split_once(";base64,")?;
        if media_type.is_empty() {
            return None;
        }
        let data = general_purpose::STANDARD.decode(payload).ok()?;
        Some(Self {
            data: Bytes::from(data),
            media_type: media_type.to_string(),
        })
    }
}

// Images serialize as their data URI so commands and snapshots stay plain JSON.
impl Serialize for RoomImage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_data_uri())
    }
}

impl<'de> Deserialize<'de> for RoomImage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let uri = String::deserialize(deserializer)?;
        RoomImage::from_data_uri(&uri)
            .ok_or_else(|| de::Error::custom("expected a base64 data URI"))
    }
}

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// A single turn in the conversation. At least one of `text` and `items` is
/// always present; the constructors below keep that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ShoppingItem>>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: Some(text.into()),
            items: None,
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            text: Some(text.into()),
            items: None,
        }
    }

    /// An AI turn carrying product suggestions alongside its lead-in text.
    pub fn ai_with_items(text: impl Into<String>, items: Vec<ShoppingItem>) -> Self {
        Self {
            sender: Sender::Ai,
            text: Some(text.into()),
            items: Some(items),
        }
    }
}

/// A suggested product. The `url` is the identity used for deduplication
/// and removal in the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    pub description: String,
    pub url: String,
}

/// The three handling paths a free-text chat message can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// The user wants the current image changed.
    Visual,
    /// The user wants product suggestions.
    Shopping,
    /// Anything else: answer conversationally.
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Visual => "visual",
            Intent::Shopping => "shopping",
            Intent::General => "general",
        }
    }
}

/// One room-redesign workflow, created on upload and replaced wholesale by
/// the next upload. `current` and `history` grow only through successful
/// generations, so `current` can never exist without `original`.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// The uploaded photo. Set once; the base every style application edits.
    pub original: RoomImage,
    /// The most recent successful redesign, if any.
    pub current: Option<RoomImage>,
    /// Every successful redesign in production order, for browsing back.
    pub history: Vec<RoomImage>,
    /// Append-only conversation, oldest turn first.
    pub transcript: Vec<ChatMessage>,
}

impl Session {
    /// Starts a fresh session around an uploaded image: no redesign yet, and
    /// a transcript opening with the AI greeting.
    pub fn start(original: RoomImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            original,
            current: None,
            history: Vec::new(),
            transcript: vec![ChatMessage::ai(GREETING)],
        }
    }

    /// Records a successful generation: replaces `current` and appends to the
    /// history.
    pub fn record_generation(&mut self, image: RoomImage) {
        self.history.push(image.clone());
        self.current = Some(image);
    }

    /// The image a visual chat edit starts from: the latest redesign when one
    /// exists, the upload otherwise.
    pub fn edit_base(&self) -> &RoomImage {
        self.current.as_ref().unwrap_or(&self.original)
    }

    /// Jumps `current` back to a previously produced image. History order and
    /// the transcript are untouched.
    pub fn revert_to(&mut self, image: RoomImage) {
        self.current = Some(image);
    }

    pub fn push_turn(&mut self, turn: ChatMessage) {
        self.transcript.push(turn);
    }
}
