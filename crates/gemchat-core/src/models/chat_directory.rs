use std::sync::Arc;

use super::conversations_store::ConversationsStore;

/// Read-through view of the store used to populate and resolve the chat list
#[derive(Clone)]
pub struct ChatDirectory {
    store: Arc<ConversationsStore>,
}

impl ChatDirectory {
    pub fn new(store: Arc<ConversationsStore>) -> Self {
        Self { store }
    }

    pub fn list_names(&self) -> Vec<String> {
        self.store.list_names()
    }

    /// `(id, name)` pairs, so callers can select by id even when names repeat
    pub fn entries(&self) -> Vec<(String, String)> {
        self.store.entries()
    }

    /// Resolve a display name to an id. The first conversation with that name wins.
    pub fn resolve_name(&self, name: &str) -> Option<String> {
        self.store
            .entries()
            .into_iter()
            .find(|(_, candidate)| candidate == name)
            .map(|(id, _)| id)
    }

    /// Default name offered when creating a new chat
    pub fn suggested_name(&self) -> String {
        format!("Chat {}", self.store.count() + 1)
    }
}
