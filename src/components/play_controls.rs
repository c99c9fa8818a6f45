// Bottom status bar: playback state, keybinding hints, volume, and queue position.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::components::Component;
use crate::player::PlaybackController;
use crate::theme::Theme;

/// Bottom status bar showing playback state, keybinding hints, and queue info.
#[derive(Default)]
pub struct PlayControls {
    action_tx: Option<UnboundedSender<Action>>,
    playing: bool,
    queue_pos: Option<usize>,
    queue_len: usize,
    volume: u8,
    shuffle: bool,
    frame_count: u64,
}

impl PlayControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, controller: &PlaybackController) {
        self.playing = controller.is_playing();
        self.queue_len = controller.queue().len();
        self.queue_pos = controller
            .current_index()
            .and_then(|current| controller.queue().iter().position(|&i| i == current));
        self.volume = controller.volume_percent();
        self.shuffle = controller.shuffle();
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }
}

impl Component for PlayControls {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) {
        self.action_tx = Some(tx);
    }

    fn update(&mut self, action: &Action) -> anyhow::Result<Vec<Action>> {
        if let Action::Tick = action {
            self.frame_count = self.frame_count.wrapping_add(1);
        }
        Ok(vec![])
    }

    fn draw(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let status = if self.playing {
            if self.frame_count % 30 < 15 {
                "♪ ▶"
            } else {
                "♫ ▶"
            }
        } else if self.queue_pos.is_some() {
            "⏸"
        } else {
            "■"
        };

        let status_color = if self.playing {
            theme.success
        } else {
            theme.text_dim
        };
        let border_color = if self.playing {
            theme.primary
        } else {
            theme.border
        };

        let queue_info = match self.queue_pos {
            Some(pos) => format!("Track {}/{}", pos + 1, self.queue_len),
            None if self.queue_len > 0 => format!("{} tracks", self.queue_len),
            None => String::new(),
        };

        let div = Span::styled(" │ ", Style::default().fg(theme.border));
        let key_style = Style::default().fg(theme.text);
        let desc_style = Style::default().fg(theme.text_dim);

        let line1 = Line::from(vec![
            Span::styled(
                format!(" {} ", status),
                Style::default()
                    .fg(status_color)
                    .add_modifier(Modifier::BOLD),
            ),
            div.clone(),
            Span::styled("Space", key_style),
            Span::styled(" Play/Pause", desc_style),
            div.clone(),
            Span::styled("n/p", key_style),
            Span::styled(" Next/Prev", desc_style),
            div.clone(),
            Span::styled("←→", key_style),
            Span::styled(" Seek", desc_style),
            div.clone(),
            Span::styled("s", key_style),
            Span::styled(
                if self.shuffle { " Shuffle on" } else { " Shuffle" },
                if self.shuffle {
                    Style::default().fg(theme.accent)
                } else {
                    desc_style
                },
            ),
            div.clone(),
            Span::styled("a/b", key_style),
            Span::styled(" Artist/Album", desc_style),
        ]);

        let line2 = Line::from(vec![
            Span::raw("   "),
            Span::styled("v", key_style),
            Span::styled(" Viz", desc_style),
            div.clone(),
            Span::styled("m t", key_style),
            Span::styled(" Mode/Theme", desc_style),
            div.clone(),
            Span::styled("+ - < >", key_style),
            Span::styled(" Sens/Smooth", desc_style),
            div.clone(),
            Span::styled("[ ]", key_style),
            Span::styled(" Vol", desc_style),
            div.clone(),
            Span::styled("?", key_style),
            Span::styled(" Help", desc_style),
            div,
            Span::styled("q", key_style),
            Span::styled(" Quit", desc_style),
            Span::raw("   "),
            Span::styled(
                format!("Vol {}%", self.volume),
                Style::default().fg(theme.primary),
            ),
            Span::raw("  "),
            Span::styled(queue_info, Style::default().fg(theme.primary)),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color));

        let paragraph = Paragraph::new(vec![line1, line2]).block(block);
        frame.render_widget(paragraph, area);
    }
}
