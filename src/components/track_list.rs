// Track list: the filtered queue with a cursor, and the playing row marked.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::components::Component;
use crate::library::format_time;
use crate::player::PlaybackController;
use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    /// Index into the full track list.
    pub index: usize,
    pub title: String,
    pub meta: String,
    /// Formatted length, once known.
    pub duration: Option<String>,
}

#[derive(Default)]
pub struct TrackList {
    action_tx: Option<UnboundedSender<Action>>,
    rows: Vec<TrackRow>,
    state: ListState,
    current: Option<usize>,
    playing: bool,
}

impl TrackList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild rows from the controller's queue, keeping the cursor on the
    /// same track when it is still listed.
    pub fn sync(&mut self, controller: &PlaybackController) {
        let selected = self.selected_track();
        let rows: Vec<TrackRow> = controller
            .queue()
            .iter()
            .filter_map(|&index| {
                controller.tracks().get(index).map(|track| TrackRow {
                    index,
                    title: track.title.clone(),
                    meta: track.meta_line(),
                    duration: track.duration.filter(|d| *d > 0.0).map(format_time),
                })
            })
            .collect();

        let changed = rows != self.rows;
        self.rows = rows;
        self.current = controller.current_index();
        self.playing = controller.is_playing();

        if changed || self.state.selected().is_none() {
            let cursor = selected
                .or(self.current)
                .and_then(|track| self.rows.iter().position(|r| r.index == track));
            let fallback = if self.rows.is_empty() { None } else { Some(0) };
            self.state.select(cursor.or(fallback));
        }
    }

    pub fn rows(&self) -> &[TrackRow] {
        &self.rows
    }

    /// Track index under the cursor.
    pub fn selected_track(&self) -> Option<usize> {
        self.state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|r| r.index)
    }

    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 1).min(self.rows.len() - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn prev(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.state.select(Some(i));
    }
}

impl Component for TrackList {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) {
        self.action_tx = Some(tx);
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.next();
                Ok(true)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.prev();
                Ok(true)
            }
            KeyCode::Enter => {
                if let Some(tx) = &self.action_tx {
                    tx.send(Action::PlaySelected)?;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn update(&mut self, action: &Action) -> anyhow::Result<Vec<Action>> {
        match action {
            Action::SelectDown => self.next(),
            Action::SelectUp => self.prev(),
            _ => {}
        }
        Ok(vec![])
    }

    fn draw(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if self.rows.is_empty() {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                "  No tracks match the current filters",
                Style::default().fg(theme.text_dim),
            )));
            frame.render_widget(paragraph, area);
            return;
        }

        let selected = self.state.selected();
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let is_current = self.current == Some(row.index);
                let is_selected = selected == Some(i);
                let marker = match (is_current, self.playing) {
                    (true, true) => "▶ ",
                    (true, false) => "⏸ ",
                    _ => "  ",
                };

                let title_style = if is_current {
                    Style::default()
                        .fg(theme.primary)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.text)
                };

                let mut title_spans = vec![
                    Span::styled(marker, Style::default().fg(theme.primary)),
                    Span::styled(format!("{:02} ", i + 1), Style::default().fg(theme.text_dim)),
                    Span::styled(row.title.clone(), title_style),
                ];
                if let Some(duration) = &row.duration {
                    title_spans.push(Span::styled(
                        format!("  {duration}"),
                        Style::default().fg(theme.text_dim),
                    ));
                }
                let title_line = Line::from(title_spans);
                let meta_line = Line::from(vec![
                    Span::raw("     "),
                    Span::styled(row.meta.clone(), Style::default().fg(theme.text_dim)),
                ]);

                let mut item = ListItem::new(vec![title_line, meta_line]);
                if is_selected {
                    item = item.style(Style::default().bg(theme.selection_bg));
                }
                item
            })
            .collect();

        let list = List::new(items).highlight_symbol("▌");
        frame.render_stateful_widget(list, area, &mut self.state.clone());
    }
}
