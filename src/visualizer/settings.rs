// Visualizer preferences: validation, persistence and the in-memory cache.
//
// One JSON record under one storage key. Reads decode leniently (booleans by
// truthiness, numbers from numeric strings) and fall back to an empty patch
// when the stored value is not a JSON object. Writes never fail the caller.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::Mode;
use crate::storage::KeyValueStore;
use crate::theme::ThemeName;

pub const DEFAULT_STORAGE_KEY: &str = "myplayer.visualizer";

pub const SENSITIVITY_RANGE: (f64, f64) = (0.1, 2.0);
pub const SMOOTHING_RANGE: (f64, f64) = (0.0, 0.99);

/// A complete, validated settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizerSettings {
    pub enabled: bool,
    pub mode: Mode,
    pub sensitivity: f64,
    pub smoothing: f64,
    pub theme: ThemeName,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: Mode::Bars,
            sensitivity: 0.85,
            smoothing: 0.6,
            theme: ThemeName::Neon,
        }
    }
}

impl VisualizerSettings {
    pub fn to_patch(&self) -> SettingsPatch {
        SettingsPatch {
            enabled: Some(self.enabled),
            mode: Some(self.mode.as_str().to_string()),
            sensitivity: Some(self.sensitivity),
            smoothing: Some(self.smoothing),
            theme: Some(self.theme.as_str().to_string()),
        }
    }
}

/// A possibly partial, unvalidated settings record. Missing fields keep
/// whatever they are merged over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl SettingsPatch {
    /// `other`'s fields win where present.
    pub fn merge(mut self, other: &SettingsPatch) -> SettingsPatch {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.mode.is_some() {
            self.mode.clone_from(&other.mode);
        }
        if other.sensitivity.is_some() {
            self.sensitivity = other.sensitivity;
        }
        if other.smoothing.is_some() {
            self.smoothing = other.smoothing;
        }
        if other.theme.is_some() {
            self.theme.clone_from(&other.theme);
        }
        self
    }

    /// Decode a loosely-typed JSON object. Non-objects yield an empty patch;
    /// fields of the wrong type are dropped.
    pub fn from_json_value(value: &Value) -> SettingsPatch {
        let Some(object) = value.as_object() else {
            return SettingsPatch::default();
        };
        SettingsPatch {
            enabled: object.get("enabled").map(truthy),
            mode: object.get("mode").and_then(Value::as_str).map(str::to_string),
            sensitivity: object.get("sensitivity").and_then(number),
            smoothing: object.get("smoothing").and_then(number),
            theme: object.get("theme").and_then(Value::as_str).map(str::to_string),
        }
    }

    pub fn from_json_str(raw: &str) -> SettingsPatch {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_json_value(&value),
            Err(e) => {
                debug!("ignoring unreadable visualizer settings: {e}");
                SettingsPatch::default()
            }
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Clamp into `range`; non-finite input takes `fallback` first.
pub fn clamp_or(value: Option<f64>, fallback: f64, range: (f64, f64)) -> f64 {
    let value = value.filter(|v| v.is_finite()).unwrap_or(fallback);
    value.clamp(range.0, range.1)
}

/// Settings Store: validation rules, defaults, storage access and cache.
pub struct SettingsStore {
    storage: Option<Rc<dyn KeyValueStore>>,
    storage_key: String,
    modes: Vec<Mode>,
    themes: Vec<ThemeName>,
    defaults: VisualizerSettings,
    cache: Option<VisualizerSettings>,
}

impl SettingsStore {
    /// `defaults` is merged over the built-in defaults and validated.
    pub fn new(storage: Option<Rc<dyn KeyValueStore>>, defaults: &SettingsPatch) -> Self {
        Self::with_options(
            storage,
            DEFAULT_STORAGE_KEY,
            defaults,
            Mode::ALL.to_vec(),
            ThemeName::ALL.to_vec(),
        )
    }

    pub fn with_options(
        storage: Option<Rc<dyn KeyValueStore>>,
        storage_key: &str,
        defaults: &SettingsPatch,
        modes: Vec<Mode>,
        themes: Vec<ThemeName>,
    ) -> Self {
        let storage_key = if storage_key.trim().is_empty() {
            DEFAULT_STORAGE_KEY.to_string()
        } else {
            storage_key.to_string()
        };
        let modes = if modes.is_empty() { Mode::ALL.to_vec() } else { modes };
        let themes = if themes.is_empty() { ThemeName::ALL.to_vec() } else { themes };
        let mut store = Self {
            storage,
            storage_key,
            modes,
            themes,
            defaults: VisualizerSettings::default(),
            cache: None,
        };
        store.defaults = store.normalize(&VisualizerSettings::default().to_patch().merge(defaults));
        store
    }

    pub fn defaults(&self) -> &VisualizerSettings {
        &self.defaults
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Validate a patch against this store's rules. Missing or invalid fields
    /// take the default; numbers are clamped. Idempotent.
    pub fn normalize(&self, patch: &SettingsPatch) -> VisualizerSettings {
        let mode = patch
            .mode
            .as_deref()
            .and_then(|m| m.parse::<Mode>().ok())
            .filter(|m| self.modes.contains(m))
            .unwrap_or(self.defaults.mode);
        let theme = patch
            .theme
            .as_deref()
            .and_then(|t| t.parse::<ThemeName>().ok())
            .filter(|t| self.themes.contains(t))
            .unwrap_or(self.defaults.theme);

        VisualizerSettings {
            enabled: patch.enabled.unwrap_or(self.defaults.enabled),
            mode,
            sensitivity: clamp_or(patch.sensitivity, self.defaults.sensitivity, SENSITIVITY_RANGE),
            smoothing: clamp_or(patch.smoothing, self.defaults.smoothing, SMOOTHING_RANGE),
            theme,
        }
    }

    /// Cached settings, or the persisted record merged over the defaults.
    pub fn load(&mut self) -> VisualizerSettings {
        if let Some(cached) = &self.cache {
            return cached.clone();
        }

        let persisted = self.read_persisted();
        let settings = self.normalize(&self.defaults.to_patch().merge(&persisted));
        self.cache = Some(settings.clone());
        settings
    }

    /// Validate, cache and persist. Storage failures are logged and ignored.
    pub fn save(&mut self, patch: &SettingsPatch) -> VisualizerSettings {
        let settings = self.normalize(patch);
        self.cache = Some(settings.clone());

        if let Some(storage) = &self.storage {
            match serde_json::to_string(&settings) {
                Ok(json) => {
                    if let Err(e) = storage.set(&self.storage_key, &json) {
                        warn!("failed to persist visualizer settings: {e:#}");
                    }
                }
                Err(e) => warn!("failed to encode visualizer settings: {e}"),
            }
        }
        settings
    }

    pub fn save_settings(&mut self, settings: &VisualizerSettings) -> VisualizerSettings {
        self.save(&settings.to_patch())
    }

    /// `save(load() merged with patch)`.
    pub fn update(&mut self, patch: &SettingsPatch) -> VisualizerSettings {
        let merged = self.load().to_patch().merge(patch);
        self.save(&merged)
    }

    fn read_persisted(&self) -> SettingsPatch {
        let Some(storage) = &self.storage else {
            return SettingsPatch::default();
        };
        match storage.get(&self.storage_key) {
            Ok(Some(raw)) if !raw.trim().is_empty() => SettingsPatch::from_json_str(&raw),
            Ok(_) => SettingsPatch::default(),
            Err(e) => {
                warn!("failed to read visualizer settings: {e:#}");
                SettingsPatch::default()
            }
        }
    }
}
