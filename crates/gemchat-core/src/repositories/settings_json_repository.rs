use std::path::PathBuf;

use super::error::{RepositoryError, RepositoryResult};
use super::settings_repository::SettingsRepository;
use crate::settings::AppConfig;

pub struct SettingsJsonRepository {
    file_path: PathBuf,
}

impl SettingsJsonRepository {
    /// Create repository with XDG-compliant path
    pub fn new() -> RepositoryResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepositoryError::InitializationError {
            message: "Cannot determine config directory".to_string(),
        })?;

        Ok(Self {
            file_path: config_dir.join("gemchat").join("config.json"),
        })
    }

    /// Create repository with custom path
    pub fn with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }
}

impl SettingsRepository for SettingsJsonRepository {
    fn load(&self) -> RepositoryResult<AppConfig> {
        if !self.file_path.exists() {
            return Ok(AppConfig::default());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        let settings: AppConfig = serde_json::from_str(&contents)?;

        Ok(settings)
    }

    fn save(&self, settings: &AppConfig) -> RepositoryResult<()> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(settings)?;

        // Write atomically using temp file + rename
        let temp_path = self.file_path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.file_path)?;

        Ok(())
    }
}
