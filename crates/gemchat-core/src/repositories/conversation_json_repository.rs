use std::fmt;
use std::path::PathBuf;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use super::conversation_repository::ConversationRepository;
use super::error::{RepositoryError, RepositoryResult};
use crate::models::Conversation;

/// JSON file-based repository for conversations.
/// Stores the whole store as one object keyed by conversation id in
/// ~/.config/gemchat/chats.json
pub struct ConversationJsonRepository {
    file_path: PathBuf,
}

impl ConversationJsonRepository {
    pub fn new() -> RepositoryResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepositoryError::InitializationError {
            message: "Could not determine config directory".to_string(),
        })?;

        Ok(Self {
            file_path: config_dir.join("gemchat").join("chats.json"),
        })
    }

    /// Create repository with custom path
    pub fn with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }
}

impl ConversationRepository for ConversationJsonRepository {
    fn load_all(&self) -> RepositoryResult<Vec<Conversation>> {
        // First run
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        let document: ConversationDocument = serde_json::from_str(&contents)?;

        Ok(document.0)
    }

    fn save_all(&self, conversations: &[Conversation]) -> RepositoryResult<()> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&ConversationDocumentRef(conversations))?;

        // Write to file atomically (write to temp, then rename)
        let temp_path = self.file_path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.file_path)?;

        Ok(())
    }

    fn storage_path(&self) -> String {
        self.file_path.to_string_lossy().to_string()
    }
}

/// Borrowed view serialized as `{ "<id>": { ...conversation } }` in store order
struct ConversationDocumentRef<'a>(&'a [Conversation]);

impl Serialize for ConversationDocumentRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for conversation in self.0 {
            map.serialize_entry(conversation.id(), conversation)?;
        }
        map.end()
    }
}

/// Owned counterpart that keeps document order instead of sorting keys
struct ConversationDocument(Vec<Conversation>);

impl<'de> Deserialize<'de> for ConversationDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = ConversationDocument;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping conversation ids to conversations")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut conversations: Vec<Conversation> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));

                while let Some((key, mut conversation)) =
                    access.next_entry::<String, Conversation>()?
                {
                    if conversation.id() != key {
                        debug!(key = %key, id = %conversation.id(), "Stored id differs from key, using key");
                        conversation.set_id(key);
                    }
                    // Later duplicates win, like a plain JSON object
                    conversations.retain(|c| c.id() != conversation.id());
                    conversations.push(conversation);
                }

                Ok(ConversationDocument(conversations))
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}
