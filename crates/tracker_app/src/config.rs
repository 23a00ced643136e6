use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracker_core::TrackerConfig;
use tracker_engine::ClientSettings;
use tracker_logging::tracker_info;

/// Contents of the optional RON config file. Every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tracker: TrackerConfig,
    pub base_url: Option<String>,
    pub csrf_token: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub request_timeout_ms: Option<u64>,
    pub status_timeout_ms: Option<u64>,
    pub submit_timeout_ms: Option<u64>,
    /// How long to wait for the attachment after the job reports complete.
    pub submission_grace_ms: Option<u64>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = ron::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .tracker
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        tracker_info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        let defaults = ClientSettings::default();
        ClientSettings {
            base_url: self.base_url.clone().unwrap_or(defaults.base_url),
            csrf_token: self.csrf_token.clone(),
            request_timeout: self
                .request_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            status_timeout: self
                .status_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.status_timeout),
            submit_timeout: self
                .submit_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.submit_timeout),
            output_dir: self.output_dir.clone().unwrap_or(defaults.output_dir),
            connect_timeout: defaults.connect_timeout,
        }
    }

    pub fn submission_grace(&self) -> Duration {
        Duration::from_millis(self.submission_grace_ms.unwrap_or(30_000))
    }
}
