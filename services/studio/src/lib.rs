//! services/studio/src/lib.rs
//!
//! The embeddable engine behind the design-consultant UI: adapters around the
//! generative model and client storage, plus the interaction controller that
//! owns all session state. The UI shell renders snapshots and submits
//! commands; everything else lives here.

pub mod adapters;
pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod media;

pub use app::{Command, InteractionController, SessionView, Snapshot};
pub use config::Config;
pub use error::StudioError;
