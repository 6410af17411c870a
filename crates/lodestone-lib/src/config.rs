//! Centralized launcher settings.
//! Constants used by the download helpers, the runtime provisioner and the
//! launch builder, plus the injectable configuration values that replace any
//! ambient "current settings" state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Identifying client string sent with every HTTP request
pub const USER_AGENT: &str = concat!("Lodestone/", env!("CARGO_PKG_VERSION"));

pub const REQUEST_TIMEOUT_SECS: u64 = 120;
pub const CONNECT_TIMEOUT_SECS: u64 = 15;

/// Default content-delivery base for synchronized client files
pub const DEFAULT_CDN_BASE_URL: &str = "https://cdn.lodestone.gg/clients";

pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 8;

/// Read/write buffer used for hashing and streamed downloads
pub const IO_CHUNK_SIZE: usize = 16384;

// Launch constants
pub const MAIN_CLASS: &str = "net.minecraft.client.main.Main";
pub const PRIMARY_ARTIFACT: &str = "minecraft.jar";
pub const LIBRARIES_DIR: &str = "libraries";
pub const NATIVES_DIR: &str = "natives";
pub const ASSETS_DIR: &str = "assets";
pub const MIN_HEAP_MB: u32 = 512;
pub const LAUNCHER_BRAND: &str = "Lodestone";

/// File under the data root holding the user's launch preferences
pub const SETTINGS_FILENAME: &str = "settings.json";

pub const DEFAULT_WINDOW_WIDTH: u32 = 925;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 530;

/// Pipeline configuration, passed into the orchestrator at construction time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per-user data root holding `clients/` and `runtimes/`
    pub data_root: PathBuf,

    /// Base URL the relative manifest paths are joined onto
    pub cdn_base_url: String,

    /// Maximum number of concurrent file downloads
    pub download_concurrency: usize,

    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(".lodestone"),
            cdn_base_url: DEFAULT_CDN_BASE_URL.to_string(),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
        }
    }
}

impl PipelineConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    pub fn with_cdn_base_url(mut self, url: impl Into<String>) -> Self {
        self.cdn_base_url = url.into();
        self
    }

    /// Build the shared HTTP client. Timeouts are per call, never pipeline-wide.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
    }
}

/// User launch preferences supplied by the settings collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LauncherSettings {
    /// Maximum heap in MB; derived from host memory when absent
    pub max_memory_mb: Option<u32>,

    /// Use this Java executable instead of a managed runtime
    pub custom_java_path: Option<PathBuf>,

    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
    pub fullscreen: bool,
}

impl LauncherSettings {
    /// Load settings from disk; a missing file yields the defaults
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;
        Ok(settings)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write settings file {:?}", path))?;
        log::debug!("Saved settings to {:?}", path);
        Ok(())
    }
}
