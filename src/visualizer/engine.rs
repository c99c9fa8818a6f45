// Render engine: owns the analysis graph, the frame loop and the
// disabled/idle/running state machine.
//
// `VisualizerEngine` is a cheap clonable handle. The frame loop holds only a
// weak reference, so dropping every handle ends it. No borrow of the engine
// is held while state listeners run, so listeners may query the engine.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use super::analysis::AnalysisGraph;
use super::particles::Particle;
use super::settings::{SENSITIVITY_RANGE, SMOOTHING_RANGE};
use super::{bars, particles, rings, wave, EngineState, Mode, RenderContext, VisualizerSettings};
use crate::canvas::{ColorStop, Paint, SharedSurface, Surface};
use crate::host::audio::AudioHost;
use crate::host::media::SharedMedia;
use crate::host::scheduler::{FrameHandle, FrameScheduler};
use crate::theme::ThemeName;

/// Capabilities the engine renders with.
pub struct EngineDeps {
    pub media: SharedMedia,
    /// `None` when the host has no drawing surface; the engine then never
    /// leaves `idle`.
    pub surface: Option<SharedSurface>,
    pub audio_host: Rc<dyn AudioHost>,
    pub scheduler: Rc<dyn FrameScheduler>,
}

pub type StateListener = Box<dyn FnMut(EngineState) -> anyhow::Result<()>>;

struct EngineCore {
    media: SharedMedia,
    surface: Option<SharedSurface>,
    audio_host: Rc<dyn AudioHost>,
    scheduler: Rc<dyn FrameScheduler>,

    settings: VisualizerSettings,
    state: EngineState,
    page_visible: bool,
    rendering: bool,
    frame: Option<FrameHandle>,
    frames_rendered: u64,

    width: f64,
    height: f64,
    pixel_ratio: f64,

    graph: AnalysisGraph,
    particles: Vec<Particle>,
    gradient: Option<(f64, Paint)>,
    rng: StdRng,

    listeners: Vec<StateListener>,
}

#[derive(Clone)]
pub struct VisualizerEngine {
    core: Rc<RefCell<EngineCore>>,
}

impl VisualizerEngine {
    pub fn new(deps: EngineDeps, initial: &VisualizerSettings) -> Self {
        Self::with_rng(deps, initial, StdRng::from_os_rng())
    }

    /// Like `new`, with a caller-supplied generator for particle spawning.
    pub fn with_rng(deps: EngineDeps, initial: &VisualizerSettings, rng: StdRng) -> Self {
        let state = if initial.enabled {
            EngineState::Idle
        } else {
            EngineState::Disabled
        };
        let core = EngineCore {
            media: deps.media,
            surface: deps.surface,
            audio_host: deps.audio_host,
            scheduler: deps.scheduler,
            settings: initial.clone(),
            state,
            page_visible: true,
            rendering: false,
            frame: None,
            frames_rendered: 0,
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
            graph: AnalysisGraph::new(),
            particles: Vec::new(),
            gradient: None,
            rng,
            listeners: Vec::new(),
        };
        debug!(state = state.as_str(), "visualizer engine created");
        Self {
            core: Rc::new(RefCell::new(core)),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn state(&self) -> EngineState {
        self.core.borrow().state
    }

    pub fn settings(&self) -> VisualizerSettings {
        self.core.borrow().settings.clone()
    }

    pub fn is_rendering(&self) -> bool {
        self.core.borrow().rendering
    }

    pub fn page_visible(&self) -> bool {
        self.core.borrow().page_visible
    }

    /// Handle of the frame currently waiting on the scheduler.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.core.borrow().frame
    }

    pub fn frames_rendered(&self) -> u64 {
        self.core.borrow().frames_rendered
    }

    pub fn has_analyser(&self) -> bool {
        self.core.borrow().graph.is_ready()
    }

    /// Analyser smoothing as last pushed into the graph.
    pub fn analyser_smoothing(&self) -> Option<f64> {
        self.core
            .borrow()
            .graph
            .analyser()
            .map(|a| a.smoothing_time_constant())
    }

    pub fn particle_count(&self) -> usize {
        self.core.borrow().particles.len()
    }

    /// Logical width, or backing width / pixel ratio when none was set.
    pub fn width(&self) -> f64 {
        self.core.borrow().width()
    }

    pub fn height(&self) -> f64 {
        self.core.borrow().height()
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.core.borrow().pixel_ratio
    }

    pub fn add_state_listener(&self, listener: StateListener) {
        self.core.borrow_mut().listeners.push(listener);
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Returns the resulting `enabled` value.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let current = self.core.borrow().settings.enabled;
        if current == enabled {
            if !enabled {
                self.notify(EngineState::Disabled);
            }
            return current;
        }

        self.core.borrow_mut().settings.enabled = enabled;
        if !enabled {
            self.stop_rendering();
            self.notify(EngineState::Disabled);
            return false;
        }

        self.notify(EngineState::Idle);
        let (playing, visible) = {
            let core = self.core.borrow();
            let playing = !core.media.borrow().paused();
            (playing, core.page_visible)
        };
        if playing && visible {
            self.handle_play();
        }
        true
    }

    /// Enter `running` if enabled, visible and the analysis graph can be
    /// built. Returns whether the loop is running afterwards.
    pub fn handle_play(&self) -> bool {
        let ready = {
            let mut core = self.core.borrow_mut();
            if !core.settings.enabled || !core.page_visible {
                return false;
            }
            core.ensure_analyser()
        };
        if !ready {
            return false;
        }
        self.notify(EngineState::Running);
        self.start_rendering();
        true
    }

    pub fn handle_pause(&self) {
        self.stop_rendering();
        let enabled = self.core.borrow().settings.enabled;
        self.notify(if enabled {
            EngineState::Idle
        } else {
            EngineState::Disabled
        });
    }

    /// Hidden stops the loop but keeps the analysis graph. Visible resumes
    /// through the play path when the media is playing.
    pub fn set_page_visibility(&self, visible: bool) {
        self.core.borrow_mut().page_visible = visible;
        let enabled = self.core.borrow().settings.enabled;
        if !visible {
            self.stop_rendering();
            if enabled {
                self.notify(EngineState::Idle);
            }
            return;
        }
        let playing = !self.core.borrow().media.borrow().paused();
        if enabled && playing {
            self.handle_play();
        }
    }

    /// Record the logical canvas size and apply the pixel-ratio transform.
    pub fn set_dimensions(&self, width: f64, height: f64, pixel_ratio: f64) {
        let mut core = self.core.borrow_mut();
        core.width = width;
        core.height = height;
        core.pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        let ratio = core.pixel_ratio;
        if let Some(surface) = &core.surface {
            surface
                .borrow_mut()
                .set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0);
        }
        core.gradient = None;
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    /// Unknown modes leave the current one in place.
    pub fn set_mode(&self, mode: &str) -> Mode {
        let mut core = self.core.borrow_mut();
        match mode.parse::<Mode>() {
            Ok(mode) => core.settings.mode = mode,
            Err(e) => debug!("rejected mode: {e}"),
        }
        core.settings.mode
    }

    /// Out-of-range values leave the current sensitivity in place.
    pub fn set_sensitivity(&self, value: f64) -> f64 {
        let mut core = self.core.borrow_mut();
        if in_range(value, SENSITIVITY_RANGE) {
            core.settings.sensitivity = value;
        } else {
            debug!(value, "rejected sensitivity");
        }
        core.settings.sensitivity
    }

    /// Also pushed into the analyser when one exists.
    pub fn set_smoothing(&self, value: f64) -> f64 {
        let mut core = self.core.borrow_mut();
        if in_range(value, SMOOTHING_RANGE) {
            core.settings.smoothing = value;
        } else {
            debug!(value, "rejected smoothing");
        }
        let smoothing = core.settings.smoothing;
        core.graph.set_smoothing(smoothing);
        smoothing
    }

    pub fn set_theme(&self, theme: &str) -> ThemeName {
        let mut core = self.core.borrow_mut();
        match theme.parse::<ThemeName>() {
            Ok(theme) => {
                core.settings.theme = theme;
                core.gradient = None;
            }
            Err(e) => debug!("rejected theme: {e}"),
        }
        core.settings.theme
    }

    /// Theme, mode, sensitivity, smoothing, then enabled.
    pub fn apply_settings(&self, settings: &VisualizerSettings) {
        self.set_theme(settings.theme.as_str());
        self.set_mode(settings.mode.as_str());
        self.set_sensitivity(settings.sensitivity);
        self.set_smoothing(settings.smoothing);
        self.set_enabled(settings.enabled);
    }

    // ── Frame loop ───────────────────────────────────────────────────────────

    fn start_rendering(&self) {
        {
            let mut core = self.core.borrow_mut();
            if core.rendering {
                return;
            }
            core.rendering = true;
        }
        schedule_frame(&self.core);
    }

    fn stop_rendering(&self) {
        let (scheduler, frame) = {
            let mut core = self.core.borrow_mut();
            if !core.rendering {
                return;
            }
            core.rendering = false;
            (Rc::clone(&core.scheduler), core.frame.take())
        };
        if let Some(handle) = frame {
            scheduler.cancel_frame(handle);
        }
    }

    /// Record the new state and run every listener with no borrow held.
    /// A failing listener is logged and the rest still run.
    fn notify(&self, state: EngineState) {
        let mut listeners = {
            let mut core = self.core.borrow_mut();
            if core.state != state {
                debug!(from = core.state.as_str(), to = state.as_str(), "visualizer state");
            }
            core.state = state;
            std::mem::take(&mut core.listeners)
        };
        for listener in listeners.iter_mut() {
            if let Err(e) = listener(state) {
                warn!("visualizer state listener failed: {e:#}");
            }
        }
        let mut core = self.core.borrow_mut();
        listeners.append(&mut core.listeners);
        core.listeners = listeners;
    }
}

fn in_range(value: f64, range: (f64, f64)) -> bool {
    value.is_finite() && value >= range.0 && value <= range.1
}

fn schedule_frame(core: &Rc<RefCell<EngineCore>>) {
    let weak: Weak<RefCell<EngineCore>> = Rc::downgrade(core);
    let scheduler = Rc::clone(&core.borrow().scheduler);
    let handle = scheduler.request_frame(Box::new(move |_timestamp| {
        if let Some(core) = weak.upgrade() {
            render_step(&core);
        }
    }));
    core.borrow_mut().frame = Some(handle);
}

fn render_step(core: &Rc<RefCell<EngineCore>>) {
    {
        let mut engine = core.borrow_mut();
        if !engine.rendering {
            return;
        }
        engine.frame = None;
        engine.render_frame();
    }
    schedule_frame(core);
}

impl EngineCore {
    fn width(&self) -> f64 {
        if self.width > 0.0 {
            return self.width;
        }
        self.surface
            .as_ref()
            .map_or(0.0, |s| f64::from(s.borrow().backing_size().0) / self.pixel_ratio)
    }

    fn height(&self) -> f64 {
        if self.height > 0.0 {
            return self.height;
        }
        self.surface
            .as_ref()
            .map_or(0.0, |s| f64::from(s.borrow().backing_size().1) / self.pixel_ratio)
    }

    fn ensure_analyser(&mut self) -> bool {
        if self.surface.is_none() {
            return false;
        }
        let smoothing = self.settings.smoothing;
        self.graph
            .ensure(self.audio_host.as_ref(), &self.media, smoothing)
    }

    /// Vertical theme gradient, rebuilt when the height or theme changes.
    fn bar_gradient(&mut self, surface: &mut dyn Surface, height: f64) -> Paint {
        if let Some((cached_height, paint)) = &self.gradient {
            if *cached_height == height {
                return paint.clone();
            }
        }
        let [bottom, top] = self.settings.theme.palette().gradient;
        let paint = surface.create_linear_gradient(
            0.0,
            height,
            0.0,
            0.0,
            vec![ColorStop::new(0.0, bottom), ColorStop::new(1.0, top)],
        );
        self.gradient = Some((height, paint.clone()));
        paint
    }

    fn render_frame(&mut self) {
        if !self.graph.is_ready() {
            return;
        }
        let Some(shared) = self.surface.clone() else {
            return;
        };
        let (width, height) = (self.width(), self.height());
        let mut surface = shared.borrow_mut();
        let palette = self.settings.theme.palette();
        let sensitivity = self.settings.sensitivity;
        self.frames_rendered += 1;

        match self.settings.mode {
            Mode::Bars => {
                let gradient = self.bar_gradient(&mut *surface, height);
                let Some(frequency) = self.graph.read_frequency() else {
                    return;
                };
                let mut ctx = RenderContext {
                    surface: &mut *surface,
                    width,
                    height,
                    sensitivity,
                    palette,
                };
                bars::draw(&mut ctx, frequency, gradient);
            }
            Mode::Wave => {
                let Some(samples) = self.graph.read_time_domain() else {
                    return;
                };
                let mut ctx = RenderContext {
                    surface: &mut *surface,
                    width,
                    height,
                    sensitivity,
                    palette,
                };
                wave::draw(&mut ctx, samples);
            }
            Mode::Rings => {
                let Some(frequency) = self.graph.read_frequency() else {
                    return;
                };
                let mut ctx = RenderContext {
                    surface: &mut *surface,
                    width,
                    height,
                    sensitivity,
                    palette,
                };
                rings::draw(&mut ctx, frequency);
            }
            Mode::Particles => {
                let Some(frequency) = self.graph.read_frequency() else {
                    return;
                };
                let mut ctx = RenderContext {
                    surface: &mut *surface,
                    width,
                    height,
                    sensitivity,
                    palette,
                };
                particles::draw(&mut ctx, frequency, &mut self.particles, &mut self.rng);
            }
        }
    }
}
