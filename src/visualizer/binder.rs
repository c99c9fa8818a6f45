// UI binder: connects the control surface, the settings store and the
// render engine, sizes the canvas to its container and forwards page and
// media lifecycle events.
//
// The binder owns no widgets. Controls arrive as `ControlEvent`s on a
// `ControlBus`, and the result is published as a `ControlView` that the UI
// renders from.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::engine::{EngineDeps, VisualizerEngine};
use super::settings::{SettingsPatch, SettingsStore, DEFAULT_STORAGE_KEY};
use super::{EngineState, Mode, VisualizerSettings};
use crate::canvas::SharedSurface;
use crate::host::audio::AudioHost;
use crate::host::events::{Listener, ListenerId, Listeners};
use crate::host::media::{MediaEvent, SharedMedia};
use crate::host::page::{PageEvent, PageHost, SharedPage};
use crate::host::scheduler::FrameScheduler;
use crate::storage::KeyValueStore;
use crate::theme::ThemeName;

/// One user interaction with a visualizer control.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Enable toggle changed to the given checked state.
    Toggle(bool),
    /// A mode button was pressed.
    Mode(String),
    Sensitivity(f64),
    Smoothing(f64),
    Theme(String),
}

/// Where controls publish their interactions. Clones share listeners.
#[derive(Clone, Default)]
pub struct ControlBus {
    listeners: Rc<RefCell<Listeners<ControlEvent>>>,
}

impl ControlBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener<ControlEvent>) -> ListenerId {
        self.listeners.borrow_mut().add(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn emit(&self, event: ControlEvent) {
        let listeners = self.listeners.borrow().snapshot();
        for listener in listeners {
            listener(&event);
        }
    }
}

/// Everything the controls and indicators should currently show.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlView {
    pub toggle_checked: bool,
    /// The one mode button styled active.
    pub active_mode: Mode,
    pub sensitivity_value: f64,
    pub smoothing_value: f64,
    pub sensitivity_label: String,
    pub smoothing_label: String,
    pub theme: ThemeName,
    pub badge_state: EngineState,
    pub badge_label: &'static str,
    /// `None` while rendering, otherwise the message shown over the canvas.
    pub placeholder: Option<&'static str>,
}

impl ControlView {
    fn from_settings(settings: &VisualizerSettings, state: EngineState) -> Self {
        let mut view = Self {
            toggle_checked: settings.enabled,
            active_mode: settings.mode,
            sensitivity_value: settings.sensitivity,
            smoothing_value: settings.smoothing,
            sensitivity_label: String::new(),
            smoothing_label: String::new(),
            theme: settings.theme,
            badge_state: state,
            badge_label: badge_label(state),
            placeholder: None,
        };
        view.sync_controls(settings);
        view
    }

    fn sync_controls(&mut self, settings: &VisualizerSettings) {
        self.toggle_checked = settings.enabled;
        self.active_mode = settings.mode;
        self.sensitivity_value = settings.sensitivity;
        self.smoothing_value = settings.smoothing;
        self.sensitivity_label = sensitivity_label(settings.sensitivity);
        self.smoothing_label = smoothing_label(settings.smoothing);
        self.theme = settings.theme;
    }
}

pub fn sensitivity_label(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("×{value:.2}")
}

pub fn smoothing_label(value: f64) -> String {
    let percent = if value.is_finite() {
        (value * 100.0).round() as i64
    } else {
        0
    };
    format!("{percent}%")
}

pub fn badge_label(state: EngineState) -> &'static str {
    match state {
        EngineState::Running => "Playing",
        EngineState::Disabled => "Off",
        EngineState::Idle => "Ready",
    }
}

/// Message shown over the canvas for a non-running engine.
pub fn placeholder_message(
    state: EngineState,
    page_hidden: bool,
    media_paused: bool,
) -> Option<&'static str> {
    match state {
        EngineState::Running => None,
        EngineState::Disabled => Some("Visualizer is off"),
        EngineState::Idle if page_hidden => Some("Window hidden, visualizer paused"),
        EngineState::Idle if media_paused => Some("Play a track to see the visualizer"),
        EngineState::Idle => Some("Waiting for audio signal"),
    }
}

pub struct AttachOptions {
    pub media: SharedMedia,
    /// No surface means nothing to bind; `attach` returns `None`.
    pub surface: Option<SharedSurface>,
    pub audio_host: Rc<dyn AudioHost>,
    pub scheduler: Rc<dyn FrameScheduler>,
    pub page: SharedPage,
    pub storage: Option<Rc<dyn KeyValueStore>>,
    pub storage_key: Option<String>,
    /// Merged over the built-in defaults.
    pub defaults: SettingsPatch,
    pub controls: ControlBus,
}

struct BinderState {
    store: SettingsStore,
    settings: VisualizerSettings,
    view: ControlView,
}

type Cleanup = Box<dyn FnOnce()>;

pub struct VisualizerBinder {
    engine: VisualizerEngine,
    state: Rc<RefCell<BinderState>>,
    cleanup: RefCell<Vec<Cleanup>>,
}

impl VisualizerBinder {
    pub fn attach(options: AttachOptions) -> Option<Self> {
        let AttachOptions {
            media,
            surface,
            audio_host,
            scheduler,
            page,
            storage,
            storage_key,
            defaults,
            controls,
        } = options;
        let surface = surface?;

        let mut store = SettingsStore::with_options(
            storage,
            storage_key.as_deref().unwrap_or(DEFAULT_STORAGE_KEY),
            &defaults,
            Mode::ALL.to_vec(),
            ThemeName::ALL.to_vec(),
        );
        let settings = store.load();

        let engine = VisualizerEngine::new(
            EngineDeps {
                media: Rc::clone(&media),
                surface: Some(Rc::clone(&surface)),
                audio_host,
                scheduler,
            },
            &settings,
        );
        let settings = store.save_settings(&engine.settings());
        let view = ControlView::from_settings(&settings, engine.state());

        let state = Rc::new(RefCell::new(BinderState {
            store,
            settings,
            view,
        }));
        let weak_page = Rc::downgrade(&page);
        let weak_media = Rc::downgrade(&media);

        engine.add_state_listener(state_listener(
            Rc::downgrade(&state),
            weak_page.clone(),
            weak_media.clone(),
        ));

        let mut cleanup: Vec<Cleanup> = Vec::new();

        // Controls
        let control_id = controls.subscribe({
            let state = Rc::downgrade(&state);
            let engine = engine.clone();
            Rc::new(move |event: &ControlEvent| handle_control(&state, &engine, event))
        });
        cleanup.push(Box::new(move || controls.unsubscribe(control_id)));

        // Media lifecycle
        let media_id = media.borrow_mut().add_listener({
            let engine = engine.clone();
            Rc::new(move |event: &MediaEvent| match event {
                MediaEvent::Play => {
                    engine.handle_play();
                }
                MediaEvent::Pause | MediaEvent::Ended => engine.handle_pause(),
                _ => {}
            })
        });
        cleanup.push(Box::new(move || {
            if let Some(media) = weak_media.upgrade() {
                media.borrow_mut().remove_listener(media_id);
            }
        }));

        // Page visibility
        let visibility_id = page.borrow_mut().observe(PageEvent::VisibilityChange, {
            let engine = engine.clone();
            let page = weak_page.clone();
            Rc::new(move |_: &PageEvent| {
                let hidden = page.upgrade().is_some_and(|p| p.borrow().is_hidden());
                engine.set_page_visibility(!hidden);
            })
        });
        if let Some(id) = visibility_id {
            cleanup.push(unobserve(weak_page.clone(), id));
        }

        // Canvas sizing
        update_canvas_size(&page, &surface, &engine);
        let resize: Listener<PageEvent> = {
            let engine = engine.clone();
            let page = weak_page.clone();
            let surface = Rc::downgrade(&surface);
            Rc::new(move |_: &PageEvent| {
                if let (Some(page), Some(surface)) = (page.upgrade(), surface.upgrade()) {
                    update_canvas_size(&page, &surface, &engine);
                }
            })
        };
        let observed = page
            .borrow_mut()
            .observe(PageEvent::ContainerResize, Rc::clone(&resize));
        let resize_id = match observed {
            Some(id) => Some(id),
            None => {
                debug!("container resize unsupported, falling back to window resize");
                page.borrow_mut().observe(PageEvent::WindowResize, resize)
            }
        };
        if let Some(id) = resize_id {
            cleanup.push(unobserve(weak_page.clone(), id));
        }

        let hidden = page.borrow().is_hidden();
        engine.set_page_visibility(!hidden);
        let current = state.borrow().settings.clone();
        engine.apply_settings(&current);
        {
            let mut binder = state.borrow_mut();
            let settings = binder.store.save_settings(&engine.settings());
            binder.view.sync_controls(&settings);
            binder.settings = settings;
        }
        let paused = media.borrow().paused();
        refresh_indicators(&mut state.borrow_mut().view, engine.state(), hidden, paused);

        Some(Self {
            engine,
            state,
            cleanup: RefCell::new(cleanup),
        })
    }

    pub fn engine(&self) -> &VisualizerEngine {
        &self.engine
    }

    pub fn settings(&self) -> VisualizerSettings {
        self.state.borrow().settings.clone()
    }

    pub fn view(&self) -> ControlView {
        self.state.borrow().view.clone()
    }

    /// Detach every listener registered by `attach`. Safe to call repeatedly.
    pub fn destroy(&self) {
        let cleanup: Vec<Cleanup> = self.cleanup.borrow_mut().drain(..).collect();
        for detach in cleanup {
            detach();
        }
    }
}

fn unobserve(page: Weak<RefCell<dyn PageHost>>, id: ListenerId) -> Cleanup {
    Box::new(move || {
        if let Some(page) = page.upgrade() {
            page.borrow_mut().unobserve(id);
        }
    })
}

fn state_listener(
    state: Weak<RefCell<BinderState>>,
    page: Weak<RefCell<dyn PageHost>>,
    media: Weak<RefCell<dyn crate::host::media::MediaElement>>,
) -> super::engine::StateListener {
    Box::new(move |engine_state: EngineState| -> anyhow::Result<()> {
        let Some(state) = state.upgrade() else {
            return Ok(());
        };
        let hidden = page.upgrade().is_some_and(|p| p.borrow().is_hidden());
        let paused = media.upgrade().map_or(true, |m| m.borrow().paused());
        let mut binder = state
            .try_borrow_mut()
            .map_err(|e| anyhow::anyhow!("binder state busy: {e}"))?;
        refresh_indicators(&mut binder.view, engine_state, hidden, paused);
        Ok(())
    })
}

fn refresh_indicators(view: &mut ControlView, state: EngineState, hidden: bool, paused: bool) {
    view.badge_state = state;
    view.badge_label = badge_label(state);
    view.placeholder = placeholder_message(state, hidden, paused);
}

/// Store first, then push the normalized value into the engine, then
/// refresh the controls. No binder borrow is held while the engine runs.
fn handle_control(
    state: &Weak<RefCell<BinderState>>,
    engine: &VisualizerEngine,
    event: &ControlEvent,
) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let patch = match event {
        ControlEvent::Toggle(checked) => SettingsPatch {
            enabled: Some(*checked),
            ..Default::default()
        },
        ControlEvent::Mode(mode) => SettingsPatch {
            mode: Some(mode.clone()),
            ..Default::default()
        },
        ControlEvent::Sensitivity(value) => SettingsPatch {
            sensitivity: Some(*value),
            ..Default::default()
        },
        ControlEvent::Smoothing(value) => SettingsPatch {
            smoothing: Some(*value),
            ..Default::default()
        },
        ControlEvent::Theme(theme) => SettingsPatch {
            theme: Some(theme.clone()),
            ..Default::default()
        },
    };

    let settings = {
        let Ok(mut binder) = state.try_borrow_mut() else {
            warn!("visualizer control ignored while binder is busy");
            return;
        };
        let settings = binder.store.update(&patch);
        binder.settings = settings.clone();
        settings
    };

    match event {
        ControlEvent::Toggle(_) => {
            engine.set_enabled(settings.enabled);
        }
        ControlEvent::Mode(_) => {
            engine.set_mode(settings.mode.as_str());
        }
        ControlEvent::Sensitivity(_) => {
            engine.set_sensitivity(settings.sensitivity);
        }
        ControlEvent::Smoothing(_) => {
            engine.set_smoothing(settings.smoothing);
        }
        ControlEvent::Theme(_) => {
            engine.set_theme(settings.theme.as_str());
        }
    }

    state.borrow_mut().view.sync_controls(&settings);
}

/// Size the backing store to the container times the pixel ratio and hand
/// the logical size to the engine. Unlaid-out containers are skipped.
fn update_canvas_size(page: &SharedPage, surface: &SharedSurface, engine: &VisualizerEngine) {
    let (size, ratio) = {
        let page = page.borrow();
        (page.container_size(), page.device_pixel_ratio())
    };
    let Some((width, height)) = size else {
        return;
    };
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
    surface.borrow_mut().set_backing_size(
        (width * ratio).round() as u32,
        (height * ratio).round() as u32,
    );
    engine.set_dimensions(width, height, ratio);
}
