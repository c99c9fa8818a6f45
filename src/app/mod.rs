// Central coordinator: owns the media element, the playback controller, the
// visualizer binding and the components.
// Runs the event loop (key → Action → handle_action → component updates → draw).

mod input;
mod playback;
mod visualizer;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::action::Action;
use crate::canvas::{BrailleCanvas, SharedSurface};
use crate::components::now_playing::NowPlaying;
use crate::components::play_controls::PlayControls;
use crate::components::track_list::TrackList;
use crate::components::visualizer_panel::VisualizerPanel;
use crate::components::Component;
use crate::config::Config;
use crate::host::audio::LevelsAudioHost;
use crate::host::page::TerminalPage;
use crate::host::scheduler::{FrameQueue, IntervalScheduler};
use crate::host::{dispatch_page_event, FrameScheduler, SharedMedia, SharedPage};
use crate::library::Track;
use crate::player::{MpvMedia, PlaybackController};
use crate::storage::{KeyValueStore, SqliteStore};
use crate::theme::Theme;
use crate::tui::{Tui, TuiEvent};
use crate::ui;
use crate::visualizer::{AttachOptions, ControlBus, SettingsPatch, VisualizerBinder};

/// How visualizer frames are pumped: by the draw loop, or by the fixed
/// fallback timer.
enum FrameDriver {
    Presented(Rc<FrameQueue>),
    Interval(Rc<IntervalScheduler>),
}

impl FrameDriver {
    fn new(frame_sync: bool) -> Self {
        if frame_sync {
            Self::Presented(Rc::new(FrameQueue::new()))
        } else {
            Self::Interval(Rc::new(IntervalScheduler::default()))
        }
    }

    fn scheduler(&self) -> Rc<dyn FrameScheduler> {
        match self {
            Self::Presented(queue) => Rc::clone(queue) as Rc<dyn FrameScheduler>,
            Self::Interval(timer) => Rc::clone(timer) as Rc<dyn FrameScheduler>,
        }
    }

    fn on_tick(&self, timestamp_ms: f64) {
        if let Self::Presented(queue) = self {
            queue.present(timestamp_ms);
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        match self {
            Self::Presented(_) => None,
            Self::Interval(timer) => timer.next_deadline(),
        }
    }

    fn run_due(&self) {
        if let Self::Interval(timer) = self {
            timer.run_due(Instant::now());
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

/// Top-level coordinator. Everything here lives on the main task; the only
/// cross-task traffic is the action channel.
pub struct App {
    running: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    started: Instant,

    // Components
    pub(crate) track_list: TrackList,
    pub(crate) now_playing: NowPlaying,
    pub(crate) visualizer_panel: VisualizerPanel,
    pub(crate) play_controls: PlayControls,

    // Hosts
    media: Rc<RefCell<MpvMedia>>,
    shared_media: SharedMedia,
    page: Rc<RefCell<TerminalPage>>,
    shared_page: SharedPage,
    audio_host: LevelsAudioHost,
    frames: FrameDriver,

    // State
    pub(crate) controller: Rc<RefCell<PlaybackController>>,
    pub(crate) binder: Option<VisualizerBinder>,
    pub(crate) controls: ControlBus,
    pub(crate) config: Config,
    theme: Theme,
    pub show_help: bool,
    pub error_message: Option<String>,
}

impl App {
    pub fn new(
        config: Config,
        tracks: Vec<Track>,
        visualizer_defaults: SettingsPatch,
    ) -> anyhow::Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let mut track_list = TrackList::new();
        let mut now_playing = NowPlaying::new();
        let mut play_controls = PlayControls::new();
        let canvas = Rc::new(RefCell::new(BrailleCanvas::default()));
        let mut visualizer_panel = VisualizerPanel::new(Rc::clone(&canvas));

        for component in [
            &mut track_list as &mut dyn Component,
            &mut now_playing,
            &mut visualizer_panel,
            &mut play_controls,
        ] {
            component.register_action_handler(action_tx.clone());
        }

        let media = Rc::new(RefCell::new(MpvMedia::new()));
        media.borrow_mut().set_action_tx(action_tx.clone());
        let shared_media: SharedMedia = media.clone();

        info!(tracks = tracks.len(), "starting player");
        let controller = Rc::new(RefCell::new(PlaybackController::new(
            tracks,
            Rc::clone(&shared_media),
        )));
        PlaybackController::subscribe(&controller);
        controller
            .borrow_mut()
            .set_volume_percent(f64::from(config.player.volume));

        let page = Rc::new(RefCell::new(TerminalPage::new()));
        let shared_page: SharedPage = page.clone();
        let audio_host = LevelsAudioHost::new();
        let frames = FrameDriver::new(config.general.frame_sync);
        let controls = ControlBus::new();

        let storage: Option<Rc<dyn KeyValueStore>> = match SqliteStore::open() {
            Ok(store) => Some(Rc::new(store)),
            Err(e) => {
                warn!("settings storage unavailable: {e:#}");
                None
            }
        };
        let surface: SharedSurface = canvas;
        let defaults = config.visualizer.defaults.clone().merge(&visualizer_defaults);
        let binder = VisualizerBinder::attach(AttachOptions {
            media: Rc::clone(&shared_media),
            surface: Some(surface),
            audio_host: Rc::new(audio_host.clone()),
            scheduler: frames.scheduler(),
            page: Rc::clone(&shared_page),
            storage,
            storage_key: Some(config.visualizer.storage_key.clone()),
            defaults,
            controls: controls.clone(),
        });

        Ok(Self {
            running: true,
            action_tx,
            action_rx,
            started: Instant::now(),
            track_list,
            now_playing,
            visualizer_panel,
            play_controls,
            media,
            shared_media,
            page,
            shared_page,
            audio_host,
            frames,
            controller,
            binder,
            controls,
            config,
            theme: Theme::default(),
            show_help: false,
            error_message: None,
        })
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut tui = Tui::new(self.config.general.frame_rate)?;
        tui.enter()?;
        self.start_duration_lookup();

        while self.running {
            self.sync_canvas_size(&tui)?;
            self.sync_components();
            let state = ui::DrawState {
                track_list: &self.track_list,
                now_playing: &self.now_playing,
                visualizer: &self.visualizer_panel,
                play_controls: &self.play_controls,
                theme: &self.theme,
                error_message: &self.error_message,
                show_help: self.show_help,
            };
            tui.draw(|frame| ui::draw(frame, &state))?;

            let deadline = self.frames.next_deadline();
            tokio::select! {
                Some(event) = tui.event_rx.recv() => {
                    match event {
                        TuiEvent::Key(key) => self.handle_key(key)?,
                        TuiEvent::Resize => {} // the canvas size is re-synced before each draw
                        TuiEvent::Focus(focused) => {
                            self.action_tx.send(Action::FocusChanged(focused))?;
                        }
                        TuiEvent::Tick => { self.action_tx.send(Action::Tick)?; }
                    }
                }
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action)?;
                }
                _ = wait_until(deadline) => self.frames.run_due(),
            }
        }

        self.shutdown();
        tui.exit()?;
        Ok(())
    }

    pub fn handle_action(&mut self, action: Action) -> anyhow::Result<()> {
        match action {
            // Lifecycle
            Action::Quit => {
                self.shutdown();
                self.running = false;
            }

            // Playback
            Action::TogglePlayPause => self.controller.borrow_mut().toggle_play(),
            Action::NextTrack => self.controller.borrow_mut().play_next(true),
            Action::PrevTrack => self.controller.borrow_mut().play_previous(),
            Action::PlaySelected => self.play_selected(),
            Action::SeekRelative(secs) => self.controller.borrow_mut().seek_relative(secs),
            Action::VolumeUp => self.adjust_volume(5.0),
            Action::VolumeDown => self.adjust_volume(-5.0),
            Action::ToggleShuffle => {
                self.controller.borrow_mut().toggle_shuffle();
            }

            // Filters
            Action::CycleArtistFilter => self.cycle_filter(crate::player::FilterGroup::Artist),
            Action::CycleAlbumFilter => self.cycle_filter(crate::player::FilterGroup::Album),
            Action::ClearFilters => self.clear_filters(),

            // Visualizer controls
            Action::ToggleVisualizer
            | Action::CycleVisualizerMode
            | Action::CycleVisualizerTheme
            | Action::SensitivityUp
            | Action::SensitivityDown
            | Action::SmoothingUp
            | Action::SmoothingDown => self.handle_visualizer_action(&action),

            // Reports from the media backend
            Action::Media(generation, event) => self.handle_media_report(generation, event)?,
            Action::MediaPosition(generation, secs) => self.handle_position(generation, secs),
            Action::MediaDuration(generation, secs) => self.handle_duration(generation, secs),
            Action::TrackDuration(index, secs) => {
                self.controller.borrow_mut().set_track_duration(index, secs);
            }
            Action::AudioLevels { rms, peak } => {
                self.audio_host
                    .set_levels(crate::host::audio::AudioLevels { rms, peak });
            }

            // Page lifecycle
            Action::FocusChanged(focused) => {
                let event = self.page.borrow_mut().set_focused(focused);
                if let Some(event) = event {
                    dispatch_page_event(&self.shared_page, event);
                }
            }

            // Errors & help
            Action::ShowError(msg) => {
                self.error_message = Some(msg);
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                    tx.send(Action::ClearError).ok();
                });
            }
            Action::ClearError => self.error_message = None,
            Action::ShowHelp => self.show_help = true,
            Action::HideHelp => self.show_help = false,

            Action::Tick => {
                let timestamp = self.started.elapsed().as_secs_f64() * 1000.0;
                self.frames.on_tick(timestamp);
                self.play_controls.update(&Action::Tick)?;
            }

            ref action @ (Action::SelectUp | Action::SelectDown) => {
                self.track_list.update(action)?;
            }
        }
        Ok(())
    }

    /// Keep the page's container size in step with the visualizer panel.
    fn sync_canvas_size(&mut self, tui: &Tui) -> anyhow::Result<()> {
        let size = tui.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        let (cols, rows) = ui::canvas_cells(area, self.error_message.is_some());
        let event = self.page.borrow_mut().set_container_cells(cols, rows);
        if let Some(event) = event {
            dispatch_page_event(&self.shared_page, event);
        }
        Ok(())
    }

    fn sync_components(&mut self) {
        {
            let controller = self.controller.borrow();
            self.track_list.sync(&controller);
            self.now_playing.sync(&controller);
            self.play_controls.sync(&controller);
        }
        let view = self.binder.as_ref().map(VisualizerBinder::view);
        if let Some(view) = &view {
            self.theme = Theme::for_visualizer(view.theme);
        }
        self.visualizer_panel.set_view(view);
    }

    fn shutdown(&mut self) {
        if let Some(binder) = &self.binder {
            binder.destroy();
        }
        self.controller.borrow_mut().unsubscribe();
        self.media.borrow_mut().stop();
    }
}
