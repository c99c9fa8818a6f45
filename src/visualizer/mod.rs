// Audio-reactive visualizer: settings store, render engine, the four
// rendering algorithms, and the binder that wires controls to both.

pub mod analysis;
pub mod bars;
pub mod binder;
pub mod engine;
pub mod particles;
pub mod rings;
pub mod settings;
pub mod wave;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::canvas::{Paint, Surface};
use crate::theme::Palette;

pub use binder::{AttachOptions, ControlBus, ControlEvent, ControlView, VisualizerBinder};
pub use engine::{EngineDeps, VisualizerEngine};
pub use settings::{SettingsPatch, SettingsStore, VisualizerSettings};

/// Identifies which rendering algorithm is active. Persisted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Bars,
    Wave,
    Rings,
    Particles,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Bars, Mode::Wave, Mode::Rings, Mode::Particles];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bars => "bars",
            Self::Wave => "wave",
            Self::Rings => "rings",
            Self::Particles => "particles",
        }
    }

    /// Cycle to the next mode.
    pub fn next(self) -> Self {
        match self {
            Self::Bars => Self::Wave,
            Self::Wave => Self::Rings,
            Self::Rings => Self::Particles,
            Self::Particles => Self::Bars,
        }
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Bars => "Bars",
            Self::Wave => "Wave",
            Self::Rings => "Rings",
            Self::Particles => "Particles",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown visualizer mode: {s}"))
    }
}

/// Engine lifecycle as seen by indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// `enabled` is off.
    Disabled,
    /// Enabled but not rendering: paused, hidden, or no analysis graph.
    Idle,
    /// The frame loop is active.
    Running,
}

impl EngineState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

/// Everything one frame of one algorithm needs.
pub struct RenderContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub width: f64,
    pub height: f64,
    pub sensitivity: f64,
    pub palette: &'a Palette,
}

impl RenderContext<'_> {
    /// Paint the theme background over the whole canvas. `alpha` overrides
    /// the background's own alpha.
    pub fn wash(&mut self, alpha: Option<f64>) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }
        let color = match alpha {
            Some(a) => self.palette.background.with_alpha(a),
            None => self.palette.background,
        };
        self.surface.save();
        self.surface.set_composite(crate::canvas::Composite::SourceOver);
        self.surface.set_fill(Paint::Solid(color));
        self.surface.fill_rect(0.0, 0.0, self.width, self.height);
        self.surface.restore();
    }
}

/// Read a byte sample as 0.0..=1.0, clamping the index into the buffer.
pub(crate) fn sample_at(buffer: &[u8], index: usize) -> f64 {
    match buffer.len() {
        0 => 0.0,
        len => f64::from(buffer[index.min(len - 1)]) / 255.0,
    }
}
