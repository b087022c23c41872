use serde::Serialize;

use crate::error::ChatError;

/// Immutable snapshot of the generation settings a session is created with
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model_name: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub system_instruction: Option<String>,
    pub enable_safety_filters: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    #[serde(rename = "HARM_CATEGORY_CIVIC_INTEGRITY")]
    CivicIntegrity,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 5] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
        HarmCategory::CivicIntegrity,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarmBlockThreshold {
    #[serde(rename = "BLOCK_NONE")]
    BlockNone,
    #[serde(rename = "BLOCK_MEDIUM_AND_ABOVE")]
    BlockMediumAndAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl GenerationConfig {
    /// One setting per harm category; the flag picks a single threshold for all of them.
    pub fn safety_settings(&self) -> Vec<SafetySetting> {
        let threshold = if self.enable_safety_filters {
            HarmBlockThreshold::BlockMediumAndAbove
        } else {
            HarmBlockThreshold::BlockNone
        };

        HarmCategory::ALL
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold,
            })
            .collect()
    }
}

/// Parameters a live session is created with, derived from a [`GenerationConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub system_instruction: Option<String>,
    pub safety_settings: Vec<SafetySetting>,
}

impl SessionParams {
    pub fn from_config(config: &GenerationConfig) -> Result<Self, ChatError> {
        let model = config.model_name.trim();
        if model.is_empty() {
            return Err(ChatError::SessionCreation(
                "model name cannot be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(ChatError::SessionCreation(format!(
                "temperature {} is outside 0.0..=2.0",
                config.temperature
            )));
        }
        if !(0.0..=1.0).contains(&config.top_p) {
            return Err(ChatError::SessionCreation(format!(
                "top_p {} is outside 0.0..=1.0",
                config.top_p
            )));
        }
        if config.top_k == 0 {
            return Err(ChatError::SessionCreation(
                "top_k must be at least 1".to_string(),
            ));
        }
        if config.max_output_tokens == 0 {
            return Err(ChatError::SessionCreation(
                "max_tokens must be at least 1".to_string(),
            ));
        }

        let system_instruction = config
            .system_instruction
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            model: model.to_string(),
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            system_instruction,
            safety_settings: config.safety_settings(),
        })
    }
}
