use tracing::warn;

use super::error::RepositoryResult;
use crate::settings::AppConfig;

pub trait SettingsRepository: Send + Sync + 'static {
    /// Load settings; a missing document yields defaults
    fn load(&self) -> RepositoryResult<AppConfig>;

    /// Save settings to storage
    fn save(&self, settings: &AppConfig) -> RepositoryResult<()>;

    /// Load settings, falling back to defaults when the document is unreadable
    fn load_or_default(&self) -> AppConfig {
        self.load().unwrap_or_else(|e| {
            warn!(error = ?e, "Failed to load settings, using defaults");
            AppConfig::default()
        })
    }
}
