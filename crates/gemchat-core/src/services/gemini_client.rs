//! Gemini `generateContent` channel over blocking HTTPS.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::exchange::{Connector, ExchangeChannel, Turn};
use crate::error::{ChatError, ChatResult, ExchangeError};
use crate::models::{ContentUnit, Role, SafetySetting, SessionParams};
use crate::settings::AppConfig;

pub struct GeminiConnector {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiConnector {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Build a connector from settings; `None` when no API key is configured
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.has_api_key() {
            return None;
        }

        Some(Self::new(
            config.api_key.trim(),
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        ))
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

impl Connector for GeminiConnector {
    fn connect(&self, params: &SessionParams) -> ChatResult<Box<dyn ExchangeChannel>> {
        let http = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ChatError::SessionCreation(format!("HTTP client: {}", e)))?;

        debug!(model = %params.model, "Opened Gemini channel");

        Ok(Box::new(GeminiChannel {
            http,
            endpoint: self.endpoint(&params.model),
            api_key: self.api_key.clone(),
            params: params.clone(),
        }))
    }
}

struct GeminiChannel {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    params: SessionParams,
}

impl ExchangeChannel for GeminiChannel {
    fn exchange(&self, history: &[Turn], turn: &[ContentUnit]) -> Result<String, ExchangeError> {
        let body = build_request(&self.params, history, turn);

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        if !status.is_success() {
            let error = parse_error(status.as_u16(), &text);
            warn!(status = status.as_u16(), error = %error, "Gemini request failed");
            return Err(error);
        }

        parse_response(&text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    generation_config: WireGenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

fn wire_parts(units: &[ContentUnit]) -> Vec<WirePart> {
    units
        .iter()
        .map(|unit| match unit {
            ContentUnit::Text(text) => WirePart::Text { text: text.clone() },
            ContentUnit::Image { mime_type, data } => WirePart::InlineData {
                inline_data: WireBlob {
                    mime_type: *mime_type,
                    data: BASE64.encode(data),
                },
            },
        })
        .collect()
}

fn build_request(
    params: &SessionParams,
    history: &[Turn],
    turn: &[ContentUnit],
) -> GenerateContentRequest {
    let mut contents: Vec<WireContent> = history
        .iter()
        .map(|t| WireContent {
            role: Some(t.role.as_str()),
            parts: wire_parts(&t.parts),
        })
        .collect();
    contents.push(WireContent {
        role: Some(Role::User.as_str()),
        parts: wire_parts(turn),
    });

    GenerateContentRequest {
        contents,
        system_instruction: params.system_instruction.as_ref().map(|text| WireContent {
            role: None,
            parts: vec![WirePart::Text { text: text.clone() }],
        }),
        generation_config: WireGenerationConfig {
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            max_output_tokens: params.max_output_tokens,
        },
        safety_settings: params.safety_settings.clone(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn parse_response(body: &str) -> Result<String, ExchangeError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ExchangeError::MalformedResponse(e.to_string()))?;

    let Some(candidate) = response.candidates.first() else {
        return match response.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => Err(ExchangeError::Blocked(reason)),
            None => Err(ExchangeError::MalformedResponse(
                "response contained no candidates".to_string(),
            )),
        };
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter(|part| !part.thought)
        .filter_map(|part| part.text.as_deref())
        .collect();

    if !text.is_empty() {
        return Ok(text);
    }

    match candidate.finish_reason.as_deref() {
        Some(reason @ ("SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII")) => {
            Err(ExchangeError::Blocked(reason.to_string()))
        }
        reason => Err(ExchangeError::MalformedResponse(format!(
            "candidate contained no text (finish reason: {})",
            reason.unwrap_or("none")
        ))),
    }
}

fn parse_error(status: u16, body: &str) -> ExchangeError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    ExchangeError::Rejected { status, message }
}
