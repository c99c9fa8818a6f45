// src/components/now_playing.rs

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::components::Component;
use crate::player::{Filters, NowPlayingView, PlaybackController};
use crate::theme::Theme;

pub struct NowPlaying {
    action_tx: Option<UnboundedSender<Action>>,
    view: Option<NowPlayingView>,
    filters: Filters,
    shuffle: bool,
    playing: bool,
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self::new()
    }
}

impl NowPlaying {
    pub fn new() -> Self {
        Self {
            action_tx: None,
            view: None,
            filters: Filters::default(),
            shuffle: false,
            playing: false,
        }
    }

    pub fn sync(&mut self, controller: &PlaybackController) {
        self.view = Some(controller.display().clone());
        self.filters = controller.filters().clone();
        self.shuffle = controller.shuffle();
        self.playing = controller.is_playing();
    }

    pub fn view(&self) -> Option<&NowPlayingView> {
        self.view.as_ref()
    }
}

fn filter_label(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "All".to_string())
}

impl Component for NowPlaying {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) {
        self.action_tx = Some(tx);
    }

    fn draw(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let Some(view) = &self.view else {
            return;
        };
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

        let title = Line::from(vec![
            Span::styled(
                if self.playing { " ♫ " } else { " ♪ " },
                Style::default().fg(theme.primary),
            ),
            Span::styled(
                view.title.clone(),
                Style::default()
                    .fg(theme.text)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        frame.render_widget(Paragraph::new(title), rows[0]);

        let meta = Line::from(Span::styled(
            format!("   {}", view.meta),
            Style::default().fg(theme.secondary),
        ));
        frame.render_widget(Paragraph::new(meta), rows[1]);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(theme.primary).bg(theme.selection_bg))
            .ratio((view.progress / 100.0).clamp(0.0, 1.0))
            .label(format!("{} / {}", view.elapsed, view.duration));
        frame.render_widget(gauge, rows[2]);

        let div = Span::styled(" │ ", Style::default().fg(theme.border));
        let label = Style::default().fg(theme.text_dim);
        let value = Style::default().fg(theme.accent);
        let info = Line::from(vec![
            Span::styled(" Artist ", label),
            Span::styled(filter_label(&self.filters.artist), value),
            div.clone(),
            Span::styled("Album ", label),
            Span::styled(filter_label(&self.filters.album), value),
            div,
            Span::styled("Shuffle ", label),
            Span::styled(if self.shuffle { "on" } else { "off" }, value),
        ]);
        frame.render_widget(Paragraph::new(info), rows[3]);
    }
}
