use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{ChatError, ChatResult, ExchangeError};
use crate::models::{ContentUnit, ConversationsStore, GenerationConfig, Message, Role, SessionParams};
use crate::services::{Connector, ExchangeChannel, Turn, normalize_attachments, text_label};

/// Result of a send that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send: blank text and no attachments
    Ignored,
    Replied {
        reply: String,
        attachments_sent: usize,
    },
}

/// Live binding between one conversation and one exchange channel
struct Session {
    conversation_id: String,
    config: GenerationConfig,
    channel: Box<dyn ExchangeChannel>,
    history: Vec<Turn>,
}

/// Owns the exchange with the remote model for the active conversation.
///
/// Unbound until [`bind`](Self::bind) succeeds. Sends are synchronous; a
/// second send while one is in flight is rejected with [`ChatError::Busy`].
pub struct SessionController {
    store: Arc<ConversationsStore>,
    connector: RwLock<Option<Arc<dyn Connector>>>,
    session: Mutex<Option<Session>>,
    in_flight: AtomicBool,
}

impl SessionController {
    pub fn new(store: Arc<ConversationsStore>, connector: Option<Arc<dyn Connector>>) -> Self {
        Self {
            store,
            connector: RwLock::new(connector),
            session: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Swap the connector used by future binds. The current session is kept.
    pub fn set_connector(&self, connector: Option<Arc<dyn Connector>>) {
        *self.connector.write() = connector;
    }

    pub fn has_connector(&self) -> bool {
        self.connector.read().is_some()
    }

    /// Bind a new session, replacing any existing one.
    ///
    /// On failure the previous binding (if any) stays in place.
    pub fn bind(&self, conversation_id: &str, config: &GenerationConfig) -> ChatResult<()> {
        let connector = self
            .connector
            .read()
            .clone()
            .ok_or_else(|| ChatError::SessionCreation("no API key configured".to_string()))?;

        if !self.store.contains(conversation_id) {
            return Err(ChatError::UnknownConversation(conversation_id.to_string()));
        }

        let params = SessionParams::from_config(config)?;
        let channel = connector.connect(&params).map_err(|e| match e {
            ChatError::SessionCreation(_) => e,
            other => ChatError::SessionCreation(other.to_string()),
        })?;

        let history = seed_history(&self.store.get_messages(conversation_id));

        info!(
            conv_id = %conversation_id,
            model = %params.model,
            seeded_turns = history.len(),
            safety_filters = config.enable_safety_filters,
            "Bound chat session"
        );

        *self.session.lock() = Some(Session {
            conversation_id: conversation_id.to_string(),
            config: config.clone(),
            channel,
            history,
        });

        Ok(())
    }

    pub fn unbind(&self) {
        if let Some(session) = self.session.lock().take() {
            debug!(conv_id = %session.conversation_id, "Unbound chat session");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.session.lock().is_some()
    }

    pub fn bound_conversation(&self) -> Option<String> {
        self.session
            .lock()
            .as_ref()
            .map(|s| s.conversation_id.clone())
    }

    /// Configuration snapshot the current session was created with
    pub fn bound_config(&self) -> Option<GenerationConfig> {
        self.session.lock().as_ref().map(|s| s.config.clone())
    }

    /// Send a user turn and record the reply.
    ///
    /// The user message is stored before the remote call. If the call fails
    /// it is removed again and the error is returned.
    pub fn send<P: AsRef<Path>>(
        &self,
        conversation_id: &str,
        text: &str,
        attachment_paths: &[P],
    ) -> ChatResult<SendOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() && attachment_paths.is_empty() {
            debug!(conv_id = %conversation_id, "Ignoring empty message");
            return Ok(SendOutcome::Ignored);
        }

        let _in_flight = InFlight::acquire(&self.in_flight).ok_or(ChatError::Busy)?;

        // Held for the whole exchange; a concurrent bind waits for it to finish
        let mut slot = self.session.lock();
        let session = slot.as_mut().ok_or(ChatError::NotConfigured)?;
        if session.conversation_id != conversation_id {
            return Err(ChatError::NotBound {
                conversation_id: conversation_id.to_string(),
            });
        }

        let descriptors: Vec<String> = attachment_paths
            .iter()
            .map(|p| p.as_ref().to_string_lossy().to_string())
            .collect();
        if !self
            .store
            .append_message(conversation_id, Role::User, text, descriptors)
        {
            return Err(ChatError::UnknownConversation(conversation_id.to_string()));
        }

        let mut units = normalize_attachments(attachment_paths);
        let attachments_sent = units.len();
        if !trimmed.is_empty() {
            units.push(ContentUnit::Text(trimmed.to_string()));
        }

        let result = if units.is_empty() {
            Err(ExchangeError::EmptyTurn)
        } else {
            debug!(
                conv_id = %conversation_id,
                parts = units.len(),
                attachments = attachments_sent,
                "Sending message"
            );
            session.channel.exchange(&session.history, &units)
        };

        match result {
            Ok(reply) => {
                self.store
                    .append_message(conversation_id, Role::Model, &reply, Vec::new());
                session.history.push(Turn::new(Role::User, units));
                session.history.push(Turn::text(Role::Model, reply.clone()));

                Ok(SendOutcome::Replied {
                    reply,
                    attachments_sent,
                })
            }
            Err(e) => {
                warn!(conv_id = %conversation_id, error = %e, "Exchange failed, rolling back user message");
                self.store.remove_last_message(conversation_id);
                Err(ChatError::Exchange(e))
            }
        }
    }
}

/// Replay stored text turns so the model keeps context after a rebind.
///
/// Attachment bytes are not replayed; each descriptor stands in as its
/// `[File: name]` label so attachment-only turns keep their place.
fn seed_history(messages: &[Message]) -> Vec<Turn> {
    messages
        .iter()
        .filter_map(|m| {
            let mut lines: Vec<String> = m
                .attachments
                .iter()
                .map(|descriptor| text_label(Path::new(descriptor)))
                .collect();
            let content = m.content.trim();
            if !content.is_empty() {
                lines.push(content.to_string());
            }
            (!lines.is_empty()).then(|| Turn::text(m.role, lines.join("\n")))
        })
        .collect()
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
