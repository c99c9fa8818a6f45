// User configuration loaded from ~/.config/myplayer/config.toml.
// Falls back to sensible defaults when the file is missing.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::metadata::DEFAULT_ENDPOINT;
use crate::visualizer::settings::{SettingsPatch, DEFAULT_STORAGE_KEY};

/// Application configuration, deserialized from `~/.config/myplayer/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Target TUI refresh rate in frames per second (default: 30).
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Drive visualizer frames from the draw loop. `false` uses the fixed
    /// 16ms fallback timer instead.
    #[serde(default = "default_true")]
    pub frame_sync: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualizerConfig {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Merged over the built-in defaults before persisted settings apply.
    #[serde(default)]
    pub defaults: SettingsPatch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    /// Initial volume percent.
    #[serde(default = "default_volume")]
    pub volume: u8,
    /// Optional JSON track list.
    #[serde(default)]
    pub tracks: Option<PathBuf>,
    /// Look up every track's duration with ffprobe at startup.
    #[serde(default = "default_true")]
    pub lookup_durations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_frame_rate() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_volume() -> u8 {
    80
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            frame_sync: true,
        }
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            defaults: SettingsPatch::default(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            tracks: None,
            lookup_durations: true,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

impl Config {
    /// Read config from disk, or return defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("myplayer")
            .join("config.toml")
    }
}
