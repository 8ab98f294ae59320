pub mod controller;
pub mod intent;
pub mod protocol;
pub mod shopping_list;
pub mod state;

// Re-export the controller surface to make it easily accessible
// to the shell that embeds the engine.
pub use controller::InteractionController;
pub use intent::IntentRouter;
pub use protocol::{Command, SessionView, Snapshot};
pub use shopping_list::ShoppingListStore;
