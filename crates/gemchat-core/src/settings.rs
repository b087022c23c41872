use serde::{Deserialize, Serialize};

use crate::models::GenerationConfig;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Persisted application configuration.
///
/// Every field has a default so that partial or older documents still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default)]
    pub system_instruction: String,
    #[serde(default = "default_enable_safety_filters")]
    pub enable_safety_filters: bool,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_key() -> String {
    std::env::var(API_KEY_ENV).unwrap_or_default()
}

fn default_model_name() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    1.0
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    40
}

fn default_enable_safety_filters() -> bool {
    true
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            model_name: default_model_name(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            system_instruction: String::new(),
            enable_safety_filters: default_enable_safety_filters(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Snapshot of the parameters a new session is created with
    pub fn generation_config(&self) -> GenerationConfig {
        let system_instruction = if self.system_instruction.trim().is_empty() {
            None
        } else {
            Some(self.system_instruction.clone())
        };

        GenerationConfig {
            model_name: self.model_name.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: self.max_tokens,
            system_instruction,
            enable_safety_filters: self.enable_safety_filters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.model_name, DEFAULT_MODEL);
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.max_tokens, 8192);
        assert_eq!(config.top_p, 0.95);
        assert_eq!(config.top_k, 40);
        assert_eq!(config.system_instruction, "");
        assert!(config.enable_safety_filters);
        assert_eq!(config.request_timeout_secs, 120);
    }

    #[test]
    fn test_partial_document_keeps_given_fields() {
        let config: AppConfig = serde_json::from_str(
            r#"{"api_key": "k", "model_name": "gemini-2.5-pro", "top_k": 64, "enable_safety_filters": false}"#,
        )
        .unwrap();

        assert_eq!(config.api_key, "k");
        assert_eq!(config.model_name, "gemini-2.5-pro");
        assert_eq!(config.top_k, 64);
        assert_eq!(config.top_p, 0.95);
        assert!(!config.enable_safety_filters);
    }

    #[test]
    fn test_generation_config_snapshot() {
        let config = AppConfig {
            api_key: "secret".to_string(),
            max_tokens: 1024,
            system_instruction: "Be brief.".to_string(),
            enable_safety_filters: false,
            ..AppConfig::default()
        };

        let snapshot = config.generation_config();
        assert_eq!(snapshot.max_output_tokens, 1024);
        assert_eq!(snapshot.system_instruction.as_deref(), Some("Be brief."));
        assert!(!snapshot.enable_safety_filters);

        let blank = AppConfig {
            system_instruction: "  ".to_string(),
            ..config
        };
        assert_eq!(blank.generation_config().system_instruction, None);
    }

    #[test]
    fn test_has_api_key() {
        let mut config = AppConfig {
            api_key: "  ".to_string(),
            ..AppConfig::default()
        };
        assert!(!config.has_api_key());
        config.api_key = "abc".to_string();
        assert!(config.has_api_key());
    }
}
