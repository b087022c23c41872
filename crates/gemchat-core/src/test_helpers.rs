use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};

use parking_lot::Mutex;

use crate::error::{ChatError, ChatResult, ExchangeError};
use crate::models::{ContentUnit, GenerationConfig, SessionParams};
use crate::services::{Connector, ExchangeChannel, Turn};

/// A request as seen by a scripted channel
#[derive(Debug, Clone)]
pub struct RecordedExchange {
    pub history: Vec<Turn>,
    pub turn: Vec<ContentUnit>,
}

/// Connector whose channels answer from a shared script
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    replies: Arc<Mutex<VecDeque<Result<String, ExchangeError>>>>,
    exchanges: Arc<Mutex<Vec<RecordedExchange>>>,
    connected: Arc<Mutex<Vec<SessionParams>>>,
    refuse: Arc<Mutex<Option<String>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, text: &str) {
        self.replies.lock().push_back(Ok(text.to_string()));
    }

    pub fn fail(&self, error: ExchangeError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Make `connect` fail with a session creation error
    pub fn refuse(&self, reason: &str) {
        *self.refuse.lock() = Some(reason.to_string());
    }

    pub fn exchanges(&self) -> Vec<RecordedExchange> {
        self.exchanges.lock().clone()
    }

    pub fn connected(&self) -> Vec<SessionParams> {
        self.connected.lock().clone()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, params: &SessionParams) -> ChatResult<Box<dyn ExchangeChannel>> {
        if let Some(reason) = self.refuse.lock().clone() {
            return Err(ChatError::SessionCreation(reason));
        }

        self.connected.lock().push(params.clone());
        Ok(Box::new(ScriptedChannel {
            script: self.clone(),
        }))
    }
}

struct ScriptedChannel {
    script: ScriptedConnector,
}

impl ExchangeChannel for ScriptedChannel {
    fn exchange(&self, history: &[Turn], turn: &[ContentUnit]) -> Result<String, ExchangeError> {
        self.script.exchanges.lock().push(RecordedExchange {
            history: history.to_vec(),
            turn: turn.to_vec(),
        });

        self.script
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ExchangeError::Transport("script exhausted".to_string())))
    }
}

/// Connector whose channel blocks inside `exchange` until released
pub struct GatedConnector {
    entered: Sender<()>,
    release: Arc<Mutex<Receiver<()>>>,
}

impl GatedConnector {
    pub fn new(entered: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            entered,
            release: Arc::new(Mutex::new(release)),
        }
    }
}

impl Connector for GatedConnector {
    fn connect(&self, _params: &SessionParams) -> ChatResult<Box<dyn ExchangeChannel>> {
        Ok(Box::new(GatedChannel {
            entered: Mutex::new(self.entered.clone()),
            release: self.release.clone(),
        }))
    }
}

struct GatedChannel {
    entered: Mutex<Sender<()>>,
    release: Arc<Mutex<Receiver<()>>>,
}

impl ExchangeChannel for GatedChannel {
    fn exchange(&self, _history: &[Turn], _turn: &[ContentUnit]) -> Result<String, ExchangeError> {
        let _ = self.entered.lock().send(());
        let _ = self.release.lock().recv();
        Ok("released".to_string())
    }
}

pub fn generation_config() -> GenerationConfig {
    GenerationConfig {
        model_name: "gemini-3-flash-preview".to_string(),
        temperature: 1.0,
        top_p: 0.95,
        top_k: 40,
        max_output_tokens: 8192,
        system_instruction: None,
        enable_safety_filters: true,
    }
}
