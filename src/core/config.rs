//! Viewer configuration management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::format::{Item, StrftimeItems};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Default delay separating a single click from a double click
pub const DEFAULT_CLICK_DELAY_MS: u64 = 250;

/// Viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// How long a single click waits for a competing double click, in milliseconds
    pub click_delay_ms: u64,
    /// strftime format for comment and edit timestamps
    pub time_format: String,
    /// Author recorded for comments posted through the comment form
    pub default_author: String,
    /// Author recorded for comments added programmatically without one
    pub action_author: String,
    /// Persistence settings
    pub storage: StorageConfig,
}

/// Persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage file override (defaults to the platform data directory)
    pub path: Option<PathBuf>,
    /// Current schema version
    pub schema_version: u32,
    pub version_key: String,
    pub comments_key: String,
    pub documents_key: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            click_delay_ms: DEFAULT_CLICK_DELAY_MS,
            time_format: "%I:%M %p".to_string(),
            default_author: "You".to_string(),
            action_author: "System".to_string(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            schema_version: 1,
            version_key: "docs-lib-version".to_string(),
            comments_key: "docs-lib-comments".to_string(),
            documents_key: "docs-lib-documents".to_string(),
        }
    }
}

impl ViewerConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "docsview", "Docsview")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the platform config directory
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from a file, using defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.sanitize();
        Ok(config)
    }

    /// Replace settings that would break rendering with their defaults
    fn sanitize(&mut self) {
        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            tracing::warn!("Invalid time format {:?}, using default", self.time_format);
            self.time_format = Self::default().time_format;
        }
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms)
    }

    /// Storage file location
    pub fn storage_path(&self) -> PathBuf {
        self.storage.path.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().join("storage.json"))
                .unwrap_or_else(|| PathBuf::from("docsview-storage.json"))
        })
    }
}
