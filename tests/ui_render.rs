// Layout and panel rendering against ratatui's TestBackend, plus the track
// list's cursor handling.

mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tokio::sync::mpsc;

use myplayer::action::Action;
use myplayer::canvas::BrailleCanvas;
use myplayer::components::now_playing::NowPlaying;
use myplayer::components::play_controls::PlayControls;
use myplayer::components::track_list::TrackList;
use myplayer::components::visualizer_panel::{VisualizerPanel, CONTROL_ROWS};
use myplayer::components::Component;
use myplayer::player::PlaybackController;
use myplayer::theme::{Theme, ThemeName};
use myplayer::tui::{self, TuiEvent};
use myplayer::ui::{self, DrawState};
use myplayer::visualizer::{ControlView, EngineState, Mode};

use common::{fake_media, sample_tracks};

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Screen {
    track_list: TrackList,
    now_playing: NowPlaying,
    visualizer: VisualizerPanel,
    play_controls: PlayControls,
    theme: Theme,
}

impl Screen {
    fn new() -> Self {
        let (_media, shared) = fake_media();
        let controller =
            PlaybackController::with_rng(sample_tracks(), shared, StdRng::seed_from_u64(2));
        let mut screen = Self {
            track_list: TrackList::new(),
            now_playing: NowPlaying::new(),
            visualizer: VisualizerPanel::new(Rc::new(RefCell::new(BrailleCanvas::with_cells(
                1, 1,
            )))),
            play_controls: PlayControls::new(),
            theme: Theme::default(),
        };
        screen.track_list.sync(&controller);
        screen.now_playing.sync(&controller);
        screen.play_controls.sync(&controller);
        screen
    }

    fn render(&self, error: Option<String>, show_help: bool) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let state = DrawState {
            track_list: &self.track_list,
            now_playing: &self.now_playing,
            visualizer: &self.visualizer,
            play_controls: &self.play_controls,
            theme: &self.theme,
            error_message: &error,
            show_help,
        };
        terminal.draw(|f| ui::draw(f, &state)).unwrap();
        buffer_text(terminal.backend().buffer())
    }
}

fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let area = buffer.area;
    let mut text = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

fn control_view(placeholder: Option<&'static str>) -> ControlView {
    ControlView {
        toggle_checked: true,
        active_mode: Mode::Rings,
        sensitivity_value: 1.2,
        smoothing_value: 0.85,
        sensitivity_label: "×1.20".to_string(),
        smoothing_label: "85%".to_string(),
        theme: ThemeName::Aurora,
        badge_state: EngineState::Idle,
        badge_label: "Ready",
        placeholder,
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

// ── Layout ───────────────────────────────────────────────────────────────────

#[test]
fn test_layout_reserves_error_row_only_when_needed() {
    let area = Rect::new(0, 0, 120, 40);
    let plain = ui::layout(area, false);
    assert_eq!(plain.error.height, 0);
    assert_eq!(plain.controls.height, 4);

    let with_error = ui::layout(area, true);
    assert_eq!(with_error.error.height, 1);
    assert_eq!(with_error.visualizer.height + 1, plain.visualizer.height);
}

#[test]
fn test_canvas_cells_exclude_control_strip() {
    let area = Rect::new(0, 0, 120, 40);
    let panels = ui::layout(area, false);
    let (cols, rows) = ui::canvas_cells(area, false);
    assert_eq!(cols, panels.visualizer.width);
    assert_eq!(rows, panels.visualizer.height - CONTROL_ROWS);
}

// ── Full screen ──────────────────────────────────────────────────────────────

#[test]
fn test_draw_shows_tracks_and_now_playing() {
    let screen = Screen::new();
    let text = screen.render(None, false);
    assert!(text.contains("Tracks"));
    assert!(text.contains("Now playing"));
    assert!(text.contains("Harbor"));
    assert!(text.contains("Tide • Low Water"));
    assert!(text.contains("Track 1/5"));
    assert!(text.contains("Visualizer unavailable"));
}

#[test]
fn test_draw_error_bar() {
    let screen = Screen::new();
    let text = screen.render(Some("mpv not found".to_string()), false);
    assert!(text.contains("mpv not found"));
}

#[test]
fn test_draw_help_overlay() {
    let screen = Screen::new();
    assert!(!screen.render(None, false).contains("Keybindings"));
    let text = screen.render(None, true);
    assert!(text.contains("Keybindings"));
    assert!(text.contains("Next visualizer mode"));
}

#[test]
fn test_visualizer_panel_controls_and_placeholder() {
    let mut screen = Screen::new();
    screen
        .visualizer
        .set_view(Some(control_view(Some("Play a track to see the visualizer"))));
    let text = screen.render(None, false);
    assert!(text.contains("● Ready"));
    assert!(text.contains("[x]"));
    assert!(text.contains("Rings"));
    assert!(text.contains("aurora"));
    assert!(text.contains("×1.20"));
    assert!(text.contains("85%"));
    assert!(text.contains("Play a track to see the visualizer"));
}

#[test]
fn test_visualizer_panel_without_placeholder_draws_canvas() {
    let mut screen = Screen::new();
    screen.visualizer.set_view(Some(control_view(None)));
    let text = screen.render(None, false);
    assert!(!text.contains("Play a track"));
    assert!(!text.contains("Visualizer unavailable"));
}

// ── Track list ───────────────────────────────────────────────────────────────

#[test]
fn test_track_list_cursor_starts_on_current_and_clamps() {
    let mut screen = Screen::new();
    let list = &mut screen.track_list;
    assert_eq!(list.rows().len(), 5);
    assert_eq!(list.selected_track(), Some(0));

    list.prev();
    assert_eq!(list.selected_track(), Some(0));
    for _ in 0..10 {
        list.next();
    }
    assert_eq!(list.selected_track(), Some(4));
}

#[test]
fn test_track_list_keys() {
    let mut screen = Screen::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    screen.track_list.register_action_handler(tx);

    assert!(screen.track_list.handle_key_event(key(KeyCode::Char('j'))).unwrap());
    assert_eq!(screen.track_list.selected_track(), Some(1));
    assert!(screen.track_list.handle_key_event(key(KeyCode::Up)).unwrap());
    assert_eq!(screen.track_list.selected_track(), Some(0));

    assert!(screen.track_list.handle_key_event(key(KeyCode::Enter)).unwrap());
    assert_eq!(rx.try_recv().unwrap(), Action::PlaySelected);

    assert!(!screen.track_list.handle_key_event(key(KeyCode::Char('q'))).unwrap());
}

#[test]
fn test_track_list_shows_looked_up_durations() {
    let (_media, shared) = fake_media();
    let mut controller =
        PlaybackController::with_rng(sample_tracks(), shared, StdRng::seed_from_u64(2));
    controller.set_track_duration(1, 187.6);
    let mut screen = Screen::new();
    screen.track_list.sync(&controller);
    assert_eq!(screen.track_list.rows()[0].duration, None);
    assert_eq!(screen.track_list.rows()[1].duration.as_deref(), Some("3:08"));
    assert!(screen.render(None, false).contains("Drift  3:08"));
}

#[test]
fn test_track_list_follows_select_actions() {
    let mut screen = Screen::new();
    screen.track_list.update(&Action::SelectDown).unwrap();
    screen.track_list.update(&Action::SelectDown).unwrap();
    assert_eq!(screen.track_list.selected_track(), Some(2));
    screen.track_list.update(&Action::SelectUp).unwrap();
    assert_eq!(screen.track_list.selected_track(), Some(1));
}

#[test]
fn test_empty_track_list_message() {
    let (_media, shared) = fake_media();
    let controller = PlaybackController::with_rng(Vec::new(), shared, StdRng::seed_from_u64(2));
    let mut screen = Screen::new();
    screen.track_list.sync(&controller);
    assert!(screen.track_list.rows().is_empty());
    let text = screen.render(None, false);
    assert!(text.contains("No tracks match the current filters"));
}

// ── Status bar ───────────────────────────────────────────────────────────────

#[test]
fn test_play_controls_sync() {
    let screen = Screen::new();
    assert!(!screen.play_controls.is_playing());
    assert_eq!(screen.play_controls.queue_len(), 5);
    assert_eq!(screen.play_controls.volume(), 100);
    assert!(screen.render(None, false).contains("Vol 100%"));
}

// ── Terminal events ──────────────────────────────────────────────────────────

#[test]
fn test_translate_keeps_presses_only() {
    let press = key(KeyCode::Char('n'));
    assert_eq!(tui::translate(Event::Key(press)), Some(TuiEvent::Key(press)));

    let release = KeyEvent::new_with_kind(
        KeyCode::Char('n'),
        KeyModifiers::NONE,
        KeyEventKind::Release,
    );
    assert_eq!(tui::translate(Event::Key(release)), None);
}

#[test]
fn test_translate_focus_and_resize() {
    assert_eq!(tui::translate(Event::FocusLost), Some(TuiEvent::Focus(false)));
    assert_eq!(tui::translate(Event::FocusGained), Some(TuiEvent::Focus(true)));
    assert_eq!(tui::translate(Event::Resize(80, 24)), Some(TuiEvent::Resize));
}

#[test]
fn test_tick_interval_falls_back_on_bad_rate() {
    assert_eq!(tui::tick_interval(50.0), Duration::from_millis(20));
    assert_eq!(tui::tick_interval(0.0), tui::tick_interval(30.0));
    assert_eq!(tui::tick_interval(f64::NAN), tui::tick_interval(30.0));
}
