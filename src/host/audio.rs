// Audio-processing capability: context, analyser and media source nodes.
//
// The engine only reaches the host through `AudioHost`, so a terminal,
// a browser binding or a test fake can all stand behind it.
// `NullAudioHost` models a host with no audio processing at all.

use std::cell::Cell;
use std::f64::consts::TAU;
use std::rc::Rc;

use super::media::SharedMedia;

/// Default analyser transform size.
pub const DEFAULT_FFT_SIZE: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("audio processing is not available on this host")]
    Unavailable,

    #[error("failed to construct audio context: {0}")]
    Construction(String),

    #[error("failed to create audio node: {0}")]
    NodeCreation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Suspended,
    Closed,
}

pub trait AudioHost {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, HostError>;
}

pub trait AudioContext {
    fn state(&self) -> ContextState;
    fn resume(&mut self) -> Result<(), HostError>;
    fn create_analyser(&mut self) -> Result<Box<dyn AnalyserNode>, HostError>;
    /// Create a source node fed by the media element's output.
    fn create_media_source(&mut self, media: &SharedMedia)
        -> Result<Box<dyn SourceNode>, HostError>;
}

pub trait SourceNode {
    /// Route `source -> analyser -> destination`.
    fn connect(&mut self, analyser: &mut dyn AnalyserNode) -> Result<(), HostError>;
    fn is_connected(&self) -> bool;
}

pub trait AnalyserNode {
    fn fft_size(&self) -> usize;
    fn set_fft_size(&mut self, size: usize);
    fn frequency_bin_count(&self) -> usize {
        self.fft_size() / 2
    }
    fn smoothing_time_constant(&self) -> f64;
    fn set_smoothing_time_constant(&mut self, value: f64);
    /// Fill `out` with byte-quantized magnitudes, one per frequency bin.
    fn byte_frequency_data(&mut self, out: &mut [u8]);
    /// Fill `out` with byte-quantized waveform samples centered at 128.
    fn byte_time_domain_data(&mut self, out: &mut [u8]);
}

/// Host without any audio-processing support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioHost;

impl AudioHost for NullAudioHost {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, HostError> {
        Err(HostError::Unavailable)
    }
}

// ── Level-driven host ────────────────────────────────────────────────────────

/// Overall loudness reported by the playback backend, both in 0.0..=1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioLevels {
    pub rms: f64,
    pub peak: f64,
}

/// Audio host for backends that only expose overall RMS/peak levels
/// (mpv's `astats` filter). The analyser spreads those levels over
/// pseudo-frequency bands so every visualizer mode has something to read.
#[derive(Clone, Default)]
pub struct LevelsAudioHost {
    levels: Rc<Cell<AudioLevels>>,
}

impl LevelsAudioHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_levels(&self, levels: AudioLevels) {
        self.levels.set(AudioLevels {
            rms: levels.rms.clamp(0.0, 1.0),
            peak: levels.peak.clamp(0.0, 1.0),
        });
    }

    pub fn levels(&self) -> AudioLevels {
        self.levels.get()
    }
}

impl AudioHost for LevelsAudioHost {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, HostError> {
        Ok(Box::new(LevelsContext {
            levels: Rc::clone(&self.levels),
            state: ContextState::Suspended,
        }))
    }
}

struct LevelsContext {
    levels: Rc<Cell<AudioLevels>>,
    state: ContextState,
}

impl AudioContext for LevelsContext {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), HostError> {
        if self.state == ContextState::Closed {
            return Err(HostError::Construction("context closed".into()));
        }
        self.state = ContextState::Running;
        Ok(())
    }

    fn create_analyser(&mut self) -> Result<Box<dyn AnalyserNode>, HostError> {
        Ok(Box::new(LevelsAnalyser::new(Rc::clone(&self.levels))))
    }

    fn create_media_source(
        &mut self,
        _media: &SharedMedia,
    ) -> Result<Box<dyn SourceNode>, HostError> {
        Ok(Box::new(LevelsSource { connected: false }))
    }
}

struct LevelsSource {
    connected: bool,
}

impl SourceNode for LevelsSource {
    // The levels feed is shared with the analyser at creation, so there is
    // no signal path to build here.
    fn connect(&mut self, _analyser: &mut dyn AnalyserNode) -> Result<(), HostError> {
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

struct LevelsAnalyser {
    levels: Rc<Cell<AudioLevels>>,
    fft_size: usize,
    smoothing: f64,
    phase: f64,
    prev_rms: f64,
    bins: Vec<f64>,
}

impl LevelsAnalyser {
    fn new(levels: Rc<Cell<AudioLevels>>) -> Self {
        Self {
            levels,
            fft_size: DEFAULT_FFT_SIZE,
            smoothing: 0.8,
            phase: 0.0,
            prev_rms: 0.0,
            bins: vec![0.0; DEFAULT_FFT_SIZE / 2],
        }
    }
}

impl AnalyserNode for LevelsAnalyser {
    fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn set_fft_size(&mut self, size: usize) {
        // Transform sizes are powers of two in 32..=32768.
        let size = size.clamp(32, 32768).next_power_of_two();
        self.fft_size = size;
        self.bins = vec![0.0; size / 2];
    }

    fn smoothing_time_constant(&self) -> f64 {
        self.smoothing
    }

    fn set_smoothing_time_constant(&mut self, value: f64) {
        if value.is_finite() {
            self.smoothing = value.clamp(0.0, 1.0);
        }
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        let AudioLevels { rms, peak } = self.levels.get();
        let smoothed = self.prev_rms * 0.3 + rms * 0.7;
        self.prev_rms = smoothed;
        self.phase += 0.05;

        let transient = if smoothed > 0.01 {
            (peak / smoothed.max(0.01) - 1.0).clamp(0.0, 0.8)
        } else {
            0.0
        };

        let count = self.bins.len().max(1);
        for (i, bin) in self.bins.iter_mut().enumerate() {
            let t = i as f64 / count as f64;
            // Energy falls off toward the high bins; each band wobbles at
            // its own rate so neighbouring bins don't move in lockstep.
            let tilt = (1.0 - t).powf(1.6);
            let freq = 1.0 + t * 9.0;
            let wobble = 0.6 + 0.4 * ((self.phase * freq + t * 40.0).sin() * 0.5 + 0.5);
            let target = ((smoothed * 2.2 * wobble + transient * 0.3) * tilt).clamp(0.0, 1.0);
            *bin = self.smoothing * *bin + (1.0 - self.smoothing) * target;
        }

        for (i, slot) in out.iter_mut().enumerate() {
            let value = self.bins.get(i).copied().unwrap_or(0.0);
            *slot = (value * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }

    fn byte_time_domain_data(&mut self, out: &mut [u8]) {
        let AudioLevels { rms, peak } = self.levels.get();
        let len = out.len().max(1) as f64;
        for (i, slot) in out.iter_mut().enumerate() {
            let t = i as f64 / len;
            let sample = rms * (t * TAU * 4.0 + self.phase).sin()
                + (peak - rms).max(0.0) * 0.5 * (t * TAU * 11.0 + self.phase * 2.0).sin();
            *slot = (128.0 + sample.clamp(-1.0, 1.0) * 127.0).round() as u8;
        }
    }
}
