// Shared test fakes for the host capabilities: media element, audio host,
// frame scheduler, drawing surface, page and a failing store.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use myplayer::canvas::{Composite, Paint, Rgba, SharedSurface, Surface};
use myplayer::host::audio::ContextState;
use myplayer::host::scheduler::FrameQueue;
use myplayer::host::{
    AnalyserNode, AudioContext, AudioHost, FrameCallback, FrameHandle, FrameScheduler, HostError,
    Listener, ListenerId, Listeners, MediaElement, MediaEvent, PageEvent, PageHost, PlaybackError,
    SharedMedia, SharedPage, SourceNode,
};
use myplayer::library::Track;
use myplayer::storage::KeyValueStore;

// ── Media element ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeMedia {
    pub src: Option<String>,
    pub paused: bool,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub volume: f64,
    pub loads: usize,
    pub play_calls: usize,
    pub pause_calls: usize,
    pub reject_play: bool,
    listeners: Listeners<MediaEvent>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self {
            paused: true,
            volume: 1.0,
            ..Self::default()
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl MediaElement for FakeMedia {
    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn set_src(&mut self, url: &str) {
        self.src = Some(url.to_string());
    }

    fn load(&mut self) {
        self.loads += 1;
        self.paused = true;
        self.current_time = 0.0;
        self.duration = None;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.play_calls += 1;
        if self.reject_play {
            return Err(PlaybackError::Rejected("autoplay blocked".into()));
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.pause_calls += 1;
        self.paused = true;
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, secs: f64) {
        self.current_time = secs;
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn add_listener(&mut self, listener: Listener<MediaEvent>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(id);
    }

    fn listeners(&self) -> Vec<Listener<MediaEvent>> {
        self.listeners.snapshot()
    }

    fn apply_event(&mut self, event: &MediaEvent) {
        match event {
            MediaEvent::Play => self.paused = false,
            MediaEvent::Pause | MediaEvent::Ended | MediaEvent::Error(_) => self.paused = true,
            _ => {}
        }
    }
}

/// The concrete fake plus the same element as the trait object the core takes.
pub fn fake_media() -> (Rc<RefCell<FakeMedia>>, SharedMedia) {
    let media = Rc::new(RefCell::new(FakeMedia::new()));
    let shared: SharedMedia = media.clone();
    (media, shared)
}

// ── Audio host ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct AudioTally {
    pub contexts: usize,
    pub resumes: usize,
    pub analysers: usize,
    pub sources: usize,
    pub connects: usize,
    /// Value every frequency bin reads as.
    pub level: u8,
    pub smoothing: Option<f64>,
}

pub struct FakeAudioHost {
    pub tally: Rc<RefCell<AudioTally>>,
}

impl FakeAudioHost {
    pub fn new(level: u8) -> (Rc<Self>, Rc<RefCell<AudioTally>>) {
        let tally = Rc::new(RefCell::new(AudioTally {
            level,
            ..AudioTally::default()
        }));
        (
            Rc::new(Self {
                tally: Rc::clone(&tally),
            }),
            tally,
        )
    }
}

impl AudioHost for FakeAudioHost {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, HostError> {
        self.tally.borrow_mut().contexts += 1;
        Ok(Box::new(FakeContext {
            tally: Rc::clone(&self.tally),
            state: ContextState::Suspended,
        }))
    }
}

struct FakeContext {
    tally: Rc<RefCell<AudioTally>>,
    state: ContextState,
}

impl AudioContext for FakeContext {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), HostError> {
        self.tally.borrow_mut().resumes += 1;
        self.state = ContextState::Running;
        Ok(())
    }

    fn create_analyser(&mut self) -> Result<Box<dyn AnalyserNode>, HostError> {
        self.tally.borrow_mut().analysers += 1;
        Ok(Box::new(FakeAnalyser {
            tally: Rc::clone(&self.tally),
            fft_size: 2048,
            smoothing: 0.8,
        }))
    }

    fn create_media_source(
        &mut self,
        _media: &SharedMedia,
    ) -> Result<Box<dyn SourceNode>, HostError> {
        self.tally.borrow_mut().sources += 1;
        Ok(Box::new(FakeSource {
            tally: Rc::clone(&self.tally),
            connected: false,
        }))
    }
}

struct FakeSource {
    tally: Rc<RefCell<AudioTally>>,
    connected: bool,
}

impl SourceNode for FakeSource {
    fn connect(&mut self, _analyser: &mut dyn AnalyserNode) -> Result<(), HostError> {
        self.tally.borrow_mut().connects += 1;
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

struct FakeAnalyser {
    tally: Rc<RefCell<AudioTally>>,
    fft_size: usize,
    smoothing: f64,
}

impl AnalyserNode for FakeAnalyser {
    fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn set_fft_size(&mut self, size: usize) {
        self.fft_size = size;
    }

    fn smoothing_time_constant(&self) -> f64 {
        self.smoothing
    }

    fn set_smoothing_time_constant(&mut self, value: f64) {
        self.smoothing = value;
        self.tally.borrow_mut().smoothing = Some(value);
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        let level = self.tally.borrow().level;
        out.iter_mut().for_each(|b| *b = level);
    }

    fn byte_time_domain_data(&mut self, out: &mut [u8]) {
        let level = self.tally.borrow().level;
        for (i, b) in out.iter_mut().enumerate() {
            *b = if i % 2 == 0 { 128u8.saturating_add(level / 2) } else { 128 - level / 2 };
        }
    }
}

// ── Scheduler ────────────────────────────────────────────────────────────────

/// A `FrameQueue` that counts requests and cancellations.
#[derive(Default)]
pub struct CountingScheduler {
    pub queue: FrameQueue,
    pub requested: Cell<usize>,
    pub cancelled: Cell<usize>,
}

impl CountingScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Run one presentation.
    pub fn present(&self) -> usize {
        self.queue.present(16.0)
    }
}

impl FrameScheduler for CountingScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        self.requested.set(self.requested.get() + 1);
        self.queue.request_frame(callback)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.cancelled.set(self.cancelled.get() + 1);
        self.queue.cancel_frame(handle);
    }
}

// ── Surface ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Save,
    Restore,
    Transform([f64; 6]),
    Fill(Paint),
    Stroke(Paint),
    LineWidth(f64),
    Shadow(f64),
    Alpha(f64),
    Composite(Composite),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Quad(f64, f64, f64, f64),
    Arc { cx: f64, cy: f64, radius: f64 },
    ClosePath,
    FillPath,
    StrokePath,
    FillRect(f64, f64, f64, f64),
}

#[derive(Default)]
pub struct RecordingSurface {
    pub ops: Vec<Op>,
    pub backing: (u32, u32),
}

impl RecordingSurface {
    pub fn shared() -> (Rc<RefCell<RecordingSurface>>, SharedSurface) {
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        let shared: SharedSurface = surface.clone();
        (surface, shared)
    }

    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.ops.push(Op::Save);
    }
    fn restore(&mut self) {
        self.ops.push(Op::Restore);
    }
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.ops.push(Op::Transform([a, b, c, d, e, f]));
    }
    fn set_fill(&mut self, paint: Paint) {
        self.ops.push(Op::Fill(paint));
    }
    fn set_stroke(&mut self, paint: Paint) {
        self.ops.push(Op::Stroke(paint));
    }
    fn set_line_width(&mut self, width: f64) {
        self.ops.push(Op::LineWidth(width));
    }
    fn set_shadow(&mut self, blur: f64, _color: Rgba) {
        self.ops.push(Op::Shadow(blur));
    }
    fn set_global_alpha(&mut self, alpha: f64) {
        self.ops.push(Op::Alpha(alpha));
    }
    fn set_composite(&mut self, op: Composite) {
        self.ops.push(Op::Composite(op));
    }
    fn begin_path(&mut self) {
        self.ops.push(Op::BeginPath);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(Op::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(Op::LineTo(x, y));
    }
    fn quadratic_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ops.push(Op::Quad(cx, cy, x, y));
    }
    fn arc(&mut self, cx: f64, cy: f64, radius: f64, _start: f64, _end: f64) {
        self.ops.push(Op::Arc { cx, cy, radius });
    }
    fn close_path(&mut self) {
        self.ops.push(Op::ClosePath);
    }
    fn fill(&mut self) {
        self.ops.push(Op::FillPath);
    }
    fn stroke(&mut self) {
        self.ops.push(Op::StrokePath);
    }
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(Op::FillRect(x, y, width, height));
    }
    fn backing_size(&self) -> (u32, u32) {
        self.backing
    }
    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.backing = (width, height);
    }
}

// ── Page ─────────────────────────────────────────────────────────────────────

pub struct FakePage {
    pub hidden: bool,
    pub ratio: f64,
    pub container: Option<(f64, f64)>,
    /// `false` models a host without container resize observation.
    pub container_observable: bool,
    visibility: Listeners<PageEvent>,
    window: Listeners<PageEvent>,
    container_listeners: Listeners<PageEvent>,
}

impl FakePage {
    pub fn new(width: f64, height: f64, ratio: f64) -> Self {
        Self {
            hidden: false,
            ratio,
            container: Some((width, height)),
            container_observable: true,
            visibility: Listeners::new(),
            window: Listeners::new(),
            container_listeners: Listeners::new(),
        }
    }

    pub fn shared(width: f64, height: f64, ratio: f64) -> (Rc<RefCell<FakePage>>, SharedPage) {
        let page = Rc::new(RefCell::new(Self::new(width, height, ratio)));
        let shared: SharedPage = page.clone();
        (page, shared)
    }

    pub fn listener_count(&self) -> usize {
        self.visibility.len() + self.window.len() + self.container_listeners.len()
    }

    pub fn window_listener_count(&self) -> usize {
        self.window.len()
    }
}

impl PageHost for FakePage {
    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.ratio
    }

    fn container_size(&self) -> Option<(f64, f64)> {
        self.container
    }

    fn observe(&mut self, kind: PageEvent, listener: Listener<PageEvent>) -> Option<ListenerId> {
        match kind {
            PageEvent::VisibilityChange => Some(self.visibility.add(listener)),
            PageEvent::WindowResize => Some(self.window.add(listener)),
            PageEvent::ContainerResize if self.container_observable => {
                Some(self.container_listeners.add(listener))
            }
            PageEvent::ContainerResize => None,
        }
    }

    fn unobserve(&mut self, id: ListenerId) {
        let _ = self.visibility.remove(id)
            || self.window.remove(id)
            || self.container_listeners.remove(id);
    }

    fn listeners(&self, kind: PageEvent) -> Vec<Listener<PageEvent>> {
        match kind {
            PageEvent::VisibilityChange => self.visibility.snapshot(),
            PageEvent::WindowResize => self.window.snapshot(),
            PageEvent::ContainerResize => self.container_listeners.snapshot(),
        }
    }
}

// ── Storage ──────────────────────────────────────────────────────────────────

pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("storage disabled")
    }

    fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        anyhow::bail!("storage disabled")
    }

    fn remove(&self, _key: &str) -> anyhow::Result<()> {
        anyhow::bail!("storage disabled")
    }
}

// ── Tracks ───────────────────────────────────────────────────────────────────

pub fn sample_tracks() -> Vec<Track> {
    vec![
        Track::new("Intro", "Nova", "First Light", "tracks/intro.mp3"),
        Track::new("Drift", "Nova", "First Light", "tracks/drift.mp3"),
        Track::new("Harbor", "Tide", "Low Water", "tracks/harbor.mp3"),
        Track::new("Signal", "Tide", "Static", "tracks/signal.mp3"),
        Track::new("Ember", "Nova", "Static", "tracks/ember.mp3"),
    ]
}
