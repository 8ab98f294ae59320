//! services/studio/src/app/protocol.rs
//!
//! Defines the command/snapshot protocol between the UI shell and the
//! interaction controller for the room-redesign assistant.

use chrono::{DateTime, Utc};
use design_consultant_core::domain::{ChatMessage, RoomImage, Session, ShoppingItem};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Commands Sent FROM the UI Shell TO the Controller
//=========================================================================================
// NOTE: Each user gesture maps to exactly one command. The controller consumes
// it, performs the transition, and answers with a fresh snapshot.
//=========================================================================================

/// Represents the structured commands the UI shell can submit.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Starts a session around an uploaded room photo, discarding any
    /// previous session wholesale.
    StartSession { image: RoomImage },

    /// Applies a named design style to the uploaded photo via the Gateway.
    ApplyStyle { style: String },

    /// Sends a free-text chat message through the intent router.
    SendMessage { text: String },

    /// Jumps the working image back to an earlier generated redesign.
    RevertTo { image: RoomImage },

    /// Renders a standalone concept image from a text description. Works with
    /// or without a live session.
    GenerateInspiration { description: String },

    /// Saves a suggested product; duplicates (by URL) are ignored.
    AddToShoppingList { item: ShoppingItem },

    /// Removes the saved product carrying this URL.
    RemoveFromShoppingList { url: String },

    /// Empties the shopping list and deletes its persisted record.
    ClearShoppingList,
}

//=========================================================================================
// Snapshots Sent FROM the Controller TO the UI Shell
//=========================================================================================

/// The live session as the UI sees it.
#[derive(Serialize, Debug, Clone)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub original: RoomImage,
    pub current: Option<RoomImage>,
    pub history: Vec<RoomImage>,
    pub transcript: Vec<ChatMessage>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            created_at: session.created_at,
            original: session.original.clone(),
            current: session.current.clone(),
            history: session.history.clone(),
            transcript: session.transcript.clone(),
        }
    }
}

/// An immutable view of the whole controller state, emitted after every
/// command and available on demand. Rendering is a pure function of this
/// value.
#[derive(Serialize, Debug, Clone)]
pub struct Snapshot {
    pub session: Option<SessionView>,
    pub shopping_list: Vec<ShoppingItem>,
    /// True while a Gateway request is in flight.
    pub busy: bool,
    /// Context-specific loading copy while busy ("Thinking...", and so on).
    pub status: Option<String>,
    /// Banner text from the most recent failure; cleared when the next
    /// request begins.
    pub last_error: Option<String>,
    /// The latest standalone concept render, if any.
    pub inspiration: Option<RoomImage>,
}
