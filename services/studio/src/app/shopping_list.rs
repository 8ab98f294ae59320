//! services/studio/src/app/shopping_list.rs
//!
//! The persisted shopping list: a URL-deduplicated collection of saved
//! products with write-through persistence over the key-value storage port.

use design_consultant_core::domain::ShoppingItem;
use design_consultant_core::ports::KeyValueStore;
use std::sync::Arc;
use tracing::{error, warn};

/// The storage key the serialized list lives under.
const STORAGE_KEY: &str = "shopping_list";

/// Saved products in insertion order, deduplicated by URL. Every mutation is
/// written through to storage; storage failures are logged and tolerated, the
/// in-memory list stays authoritative for the running process.
pub struct ShoppingListStore {
    storage: Arc<dyn KeyValueStore>,
    items: Vec<ShoppingItem>,
}

impl ShoppingListStore {
    /// Restores the list persisted in `storage`. Missing or corrupt data
    /// degrades to an empty list without failing startup.
    pub async fn restore(storage: Arc<dyn KeyValueStore>) -> Self {
        let items = match storage.load(STORAGE_KEY).await {
            Ok(Some(serialized)) => match serde_json::from_str::<Vec<ShoppingItem>>(&serialized) {
                Ok(items) => items,
                Err(err) => {
                    warn!("Persisted shopping list is corrupt, starting empty: {err}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Failed to load the persisted shopping list, starting empty: {err}");
                Vec::new()
            }
        };
        Self { storage, items }
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn contains(&self, url: &str) -> bool {
        self.items.iter().any(|item| item.url == url)
    }

    /// Adds `item` unless its URL is already present (the first write wins),
    /// then persists.
    pub async fn add(&mut self, item: ShoppingItem) {
        if self.contains(&item.url) {
            return;
        }
        self.items.push(item);
        self.persist().await;
    }

    /// Removes the entry carrying `url`, then persists.
    pub async fn remove(&mut self, url: &str) {
        self.items.retain(|item| item.url != url);
        self.persist().await;
    }

    /// Empties the list and deletes the persisted record.
    pub async fn clear(&mut self) {
        self.items.clear();
        if let Err(err) = self.storage.clear(STORAGE_KEY).await {
            error!("Failed to clear the persisted shopping list: {err}");
        }
    }

    async fn persist(&self) {
        let serialized = match serde_json::to_string(&self.items) {
            Ok(serialized) => serialized,
            Err(err) => {
                error!("Failed to serialize the shopping list: {err}");
                return;
            }
        };
        if let Err(err) = self.storage.save(STORAGE_KEY, &serialized).await {
            error!("Failed to persist the shopping list: {err}");
        }
    }
}
