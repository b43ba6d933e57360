use crate::resolver::{ReadyPolicy, ResolverSettings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "mapsearch";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Map-data region used when no host state says otherwise
    #[serde(default = "default_region")]
    pub region: String,

    /// Plus Codes decode endpoint
    #[serde(default = "default_grid_code_url")]
    pub grid_code_url: String,

    /// what3words convert-to-coordinates endpoint
    #[serde(default = "default_word_address_url")]
    pub word_address_url: String,

    /// what3words API key. Word-address lookups fail without one.
    #[serde(default)]
    pub word_address_key: String,

    /// Segment/venue finder endpoint
    #[serde(default = "default_finder_url")]
    pub finder_url: String,

    /// Regions the finder covers
    #[serde(default = "default_finder_regions")]
    pub finder_regions: Vec<String>,

    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Delay between polls of the host's loading flag
    #[serde(default = "default_ready_poll_interval_ms")]
    pub ready_poll_interval_ms: u64,

    /// Polls before giving up on the host finishing its load
    #[serde(default = "default_ready_poll_attempts")]
    pub ready_poll_attempts: u32,

    /// Pause before the input is cleared after a readiness wait
    #[serde(default = "default_clear_delay_ms")]
    pub clear_delay_ms: u64,

    /// Zoom for jumps to objects located by the finder
    #[serde(default = "default_finder_zoom")]
    pub finder_zoom: i64,

    /// Nested short/tracked link redirects followed
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_region() -> String {
    "usa".to_string()
}

fn default_grid_code_url() -> String {
    "https://plus.codes/api".to_string()
}

fn default_word_address_url() -> String {
    "https://api.what3words.com/v3/convert-to-coordinates".to_string()
}

fn default_finder_url() -> String {
    "https://w-tools.org/api/SegmentFinder".to_string()
}

fn default_finder_regions() -> Vec<String> {
    vec!["usa".to_string()]
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_ready_poll_interval_ms() -> u64 {
    100
}

fn default_ready_poll_attempts() -> u32 {
    50
}

fn default_clear_delay_ms() -> u64 {
    100
}

fn default_finder_zoom() -> i64 {
    18 // legacy zoom 6
}

fn default_max_redirects() -> usize {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            grid_code_url: default_grid_code_url(),
            word_address_url: default_word_address_url(),
            word_address_key: String::new(),
            finder_url: default_finder_url(),
            finder_regions: default_finder_regions(),
            http_timeout_ms: default_http_timeout_ms(),
            ready_poll_interval_ms: default_ready_poll_interval_ms(),
            ready_poll_attempts: default_ready_poll_attempts(),
            clear_delay_ms: default_clear_delay_ms(),
            finder_zoom: default_finder_zoom(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from an explicit path, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            ready: ReadyPolicy {
                interval: Duration::from_millis(self.ready_poll_interval_ms),
                max_attempts: self.ready_poll_attempts,
            },
            clear_delay: Duration::from_millis(self.clear_delay_ms),
            finder_zoom: self.finder_zoom,
            max_redirects: self.max_redirects,
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
