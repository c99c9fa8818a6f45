// Layout and rendering: splits the terminal into panels and composites
// overlays (help, error bar).

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::components::now_playing::NowPlaying;
use crate::components::play_controls::PlayControls;
use crate::components::track_list::TrackList;
use crate::components::visualizer_panel::VisualizerPanel;
use crate::components::Component;
use crate::theme::Theme;

pub struct DrawState<'a> {
    pub track_list: &'a TrackList,
    pub now_playing: &'a NowPlaying,
    pub visualizer: &'a VisualizerPanel,
    pub play_controls: &'a PlayControls,
    pub theme: &'a Theme,
    pub error_message: &'a Option<String>,
    pub show_help: bool,
}

/// Where each panel goes for a given terminal area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panels {
    /// Bordered frames around the two columns.
    pub tracks_frame: Rect,
    pub player_frame: Rect,
    pub track_list: Rect,
    pub now_playing: Rect,
    pub visualizer: Rect,
    pub error: Rect,
    pub controls: Rect,
}

const NOW_PLAYING_ROWS: u16 = 5;

pub fn layout(area: Rect, has_error: bool) -> Panels {
    let error_height = if has_error { 1 } else { 0 };
    let [content, error, controls] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(error_height),
        Constraint::Length(4),
    ])
    .areas(area);

    let [left, right] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .areas(content);

    let [now_playing, visualizer] =
        Layout::vertical([Constraint::Length(NOW_PLAYING_ROWS), Constraint::Min(0)])
            .areas(inner(right));

    Panels {
        tracks_frame: left,
        player_frame: right,
        track_list: inner(left),
        now_playing,
        visualizer,
        error,
        controls,
    }
}

/// Size of the visualizer canvas in cells.
pub fn canvas_cells(area: Rect, has_error: bool) -> (u16, u16) {
    let canvas = VisualizerPanel::canvas_area(layout(area, has_error).visualizer);
    (canvas.width, canvas.height)
}

fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

fn panel_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(theme.border))
}

pub fn draw(frame: &mut Frame, state: &DrawState) {
    let theme = state.theme;
    let panels = layout(frame.area(), state.error_message.is_some());

    frame.render_widget(panel_block("Tracks", theme), panels.tracks_frame);
    frame.render_widget(panel_block("Now playing", theme), panels.player_frame);

    state.track_list.draw(frame, panels.track_list, theme);
    state.now_playing.draw(frame, panels.now_playing, theme);
    state.visualizer.draw(frame, panels.visualizer, theme);

    if let Some(ref msg) = state.error_message {
        let error_line = Line::from(vec![
            Span::styled(" ⚠ ", Style::default().fg(theme.error)),
            Span::styled(msg.as_str(), Style::default().fg(theme.accent)),
        ]);
        frame.render_widget(Paragraph::new(error_line), panels.error);
    }

    state.play_controls.draw(frame, panels.controls, theme);

    if state.show_help {
        draw_help_overlay(frame, theme);
    }
}

fn draw_help_overlay(frame: &mut Frame, theme: &Theme) {
    let area = frame.area();
    let overlay_width = 54u16;
    let overlay_height = 26u16;
    let x = area.width.saturating_sub(overlay_width) / 2;
    let y = area.height.saturating_sub(overlay_height) / 2;
    let overlay_area = Rect::new(
        x,
        y,
        overlay_width.min(area.width),
        overlay_height.min(area.height),
    );

    frame.render_widget(Clear, overlay_area);

    let keybindings = [
        ("q", "Quit"),
        ("j / Down", "Move cursor down"),
        ("k / Up", "Move cursor up"),
        ("Enter", "Play selected track"),
        ("Space", "Toggle play/pause"),
        ("n", "Next track"),
        ("p", "Previous track"),
        ("Left / Right", "Seek 5s"),
        ("s", "Toggle shuffle"),
        ("a", "Cycle artist filter"),
        ("b", "Cycle album filter"),
        ("c", "Clear filters"),
        ("[ ]", "Volume down/up"),
        ("v", "Toggle visualizer"),
        ("m", "Next visualizer mode"),
        ("t", "Next visualizer theme"),
        ("+ / -", "Sensitivity up/down"),
        ("> / <", "Smoothing up/down"),
        ("?", "Toggle this help overlay"),
    ];

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            " Keybindings ",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (key, desc) in &keybindings {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:14}", key), Style::default().fg(theme.accent)),
            Span::raw(*desc),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press any key to close",
        Style::default().fg(theme.text_dim),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .title_alignment(Alignment::Center);
    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, overlay_area);
}
