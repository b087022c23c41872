use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::session_controller::{SendOutcome, SessionController};
use crate::error::{ChatError, ChatResult};
use crate::models::{ChatDirectory, Conversation, ConversationsStore};
use crate::repositories::SettingsRepository;
use crate::services::{Connector, GeminiConnector};
use crate::settings::AppConfig;

/// Builds the connector for a configuration; `None` means no usable credential
pub type ConnectorBuilder = Box<dyn Fn(&AppConfig) -> Option<Arc<dyn Connector>> + Send + Sync>;

/// The default builder, talking to the Gemini API
pub fn gemini_connector_builder() -> ConnectorBuilder {
    Box::new(|config| {
        GeminiConnector::from_config(config).map(|c| Arc::new(c) as Arc<dyn Connector>)
    })
}

/// Everything a front end can ask the core to do
#[derive(Debug, Clone)]
pub enum Intent {
    CreateConversation { name: String },
    SelectConversation { id: String },
    DeleteConversation { id: String },
    SendMessage { text: String, attachments: Vec<PathBuf> },
    SaveConfig(AppConfig),
    ResetConfig,
}

#[derive(Debug)]
pub enum Outcome {
    /// Created and selected; `session_error` is set when no session could be bound
    Created {
        id: String,
        session_error: Option<ChatError>,
    },
    Selected {
        id: String,
        session_error: Option<ChatError>,
    },
    Deleted {
        id: String,
        existed: bool,
    },
    Sent(SendOutcome),
    ConfigSaved {
        persisted: bool,
        session_error: Option<ChatError>,
    },
    ConfigReset,
}

/// Process-wide application state, constructed once by the entry point
pub struct AppController {
    config: AppConfig,
    settings: Arc<dyn SettingsRepository>,
    store: Arc<ConversationsStore>,
    directory: ChatDirectory,
    sessions: SessionController,
    connector_builder: ConnectorBuilder,
    active_id: Option<String>,
}

impl AppController {
    pub fn new(
        settings: Arc<dyn SettingsRepository>,
        store: Arc<ConversationsStore>,
        connector_builder: ConnectorBuilder,
    ) -> Self {
        let config = settings.load_or_default();
        let connector = connector_builder(&config);
        if connector.is_none() {
            info!("No API key configured, sending is disabled until one is saved");
        }

        Self {
            directory: ChatDirectory::new(store.clone()),
            sessions: SessionController::new(store.clone(), connector),
            config,
            settings,
            store,
            connector_builder,
            active_id: None,
        }
    }

    pub fn dispatch(&mut self, intent: Intent) -> ChatResult<Outcome> {
        debug!(intent = intent_name(&intent), "Dispatching intent");

        match intent {
            Intent::CreateConversation { name } => {
                let id = self.store.create_conversation(&name);
                let session_error = self.activate(&id);
                Ok(Outcome::Created { id, session_error })
            }
            Intent::SelectConversation { id } => {
                if !self.store.contains(&id) {
                    return Err(ChatError::UnknownConversation(id));
                }
                let session_error = self.activate(&id);
                Ok(Outcome::Selected { id, session_error })
            }
            Intent::DeleteConversation { id } => {
                let existed = self.store.delete_conversation(&id);
                if self.active_id.as_deref() == Some(id.as_str()) {
                    self.active_id = None;
                    self.sessions.unbind();
                }
                Ok(Outcome::Deleted { id, existed })
            }
            Intent::SendMessage { text, attachments } => {
                let id = self
                    .active_id
                    .clone()
                    .ok_or(ChatError::NoActiveConversation)?;

                if self.sessions.bound_conversation().as_deref() != Some(id.as_str())
                    && (!text.trim().is_empty() || !attachments.is_empty())
                {
                    if !self.sessions.has_connector() {
                        return Err(ChatError::NotConfigured);
                    }
                    self.sessions.bind(&id, &self.config.generation_config())?;
                }

                self.sessions
                    .send(&id, &text, attachments.as_slice())
                    .map(Outcome::Sent)
            }
            Intent::SaveConfig(config) => Ok(self.save_config(config)),
            Intent::ResetConfig => {
                self.config = self.settings.load_or_default();
                self.sessions.set_connector((self.connector_builder)(&self.config));
                info!("Settings reloaded from disk");
                Ok(Outcome::ConfigReset)
            }
        }
    }

    /// Select `id` and bind a session to it, reporting (not propagating) bind failures
    fn activate(&mut self, id: &str) -> Option<ChatError> {
        self.active_id = Some(id.to_string());

        match self.sessions.bind(id, &self.config.generation_config()) {
            Ok(()) => None,
            Err(e) => {
                // Never send on a session bound to a different chat
                self.sessions.unbind();
                warn!(conv_id = %id, error = %e, "Failed to create chat session");
                Some(e)
            }
        }
    }

    fn save_config(&mut self, config: AppConfig) -> Outcome {
        let persisted = match self.settings.save(&config) {
            Ok(()) => true,
            Err(e) => {
                error!(error = ?e, "Failed to save settings");
                false
            }
        };
        self.config = config;

        let connector = (self.connector_builder)(&self.config);
        let has_connector = connector.is_some();
        self.sessions.set_connector(connector);

        let session_error = match (&self.active_id, has_connector) {
            (Some(id), true) => self
                .sessions
                .bind(id, &self.config.generation_config())
                .err(),
            (_, false) => {
                self.sessions.unbind();
                None
            }
            (None, true) => None,
        };

        if let Some(e) = &session_error {
            warn!(error = %e, "Failed to recreate chat session after saving settings");
        }
        info!(persisted, model = %self.config.model_name, "Settings saved");

        Outcome::ConfigSaved {
            persisted,
            session_error,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn directory(&self) -> &ChatDirectory {
        &self.directory
    }

    pub fn store(&self) -> &Arc<ConversationsStore> {
        &self.store
    }

    pub fn sessions(&self) -> &SessionController {
        &self.sessions
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active_conversation(&self) -> Option<Conversation> {
        self.active_id
            .as_deref()
            .and_then(|id| self.store.get_conversation(id))
    }

    pub fn status_line(&self) -> String {
        format!(
            "Model: {} | Filters: {}",
            self.config.model_name,
            if self.config.enable_safety_filters {
                "on"
            } else {
                "off"
            }
        )
    }
}

fn intent_name(intent: &Intent) -> &'static str {
    match intent {
        Intent::CreateConversation { .. } => "CreateConversation",
        Intent::SelectConversation { .. } => "SelectConversation",
        Intent::DeleteConversation { .. } => "DeleteConversation",
        Intent::SendMessage { .. } => "SendMessage",
        Intent::SaveConfig(_) => "SaveConfig",
        Intent::ResetConfig => "ResetConfig",
    }
}
