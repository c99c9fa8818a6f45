// Terminal backend: raw-mode setup, event polling, and tick generation.
// The rest of the app only sees `TuiEvent`s: key presses, resizes, focus
// changes and draw ticks.

use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event as CrosstermEvent, KeyEvent,
        KeyEventKind,
    },
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::time::Duration;
use tokio::sync::mpsc;

type CrosstermTerminal = Terminal<CrosstermBackend<std::io::Stderr>>;

/// Frames per second used when the configured rate is unusable.
const FALLBACK_FRAME_RATE: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub enum TuiEvent {
    Key(KeyEvent),
    Resize,
    /// Window focus gained (`true`) or lost.
    Focus(bool),
    Tick,
}

/// Map a raw terminal event to what the app handles. Key releases and
/// repeats, mouse and paste events are dropped.
pub fn translate(event: CrosstermEvent) -> Option<TuiEvent> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
        CrosstermEvent::Resize(..) => Some(TuiEvent::Resize),
        CrosstermEvent::FocusGained => Some(TuiEvent::Focus(true)),
        CrosstermEvent::FocusLost => Some(TuiEvent::Focus(false)),
        _ => None,
    }
}

/// Time between draw ticks for a frame rate.
pub fn tick_interval(frame_rate: f64) -> Duration {
    let rate = if frame_rate.is_finite() && frame_rate > 0.0 {
        frame_rate
    } else {
        FALLBACK_FRAME_RATE
    };
    Duration::from_secs_f64(1.0 / rate)
}

pub struct Tui {
    terminal: CrosstermTerminal,
    pub event_rx: mpsc::UnboundedReceiver<TuiEvent>,
    event_tx: mpsc::UnboundedSender<TuiEvent>,
    tick: Duration,
}

impl Tui {
    pub fn new(frame_rate: f64) -> anyhow::Result<Self> {
        let terminal = Terminal::new(CrosstermBackend::new(std::io::stderr()))?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Ok(Self {
            terminal,
            event_rx,
            event_tx,
            tick: tick_interval(frame_rate),
        })
    }

    pub fn enter(&mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(std::io::stderr(), EnterAlternateScreen, EnableFocusChange)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        self.spawn_event_reader();
        Ok(())
    }

    pub fn exit(&mut self) -> anyhow::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(std::io::stderr(), DisableFocusChange, LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Forward terminal events and draw ticks until the event stream ends
    /// or the receiver is gone.
    fn spawn_event_reader(&self) {
        let tx = self.event_tx.clone();
        let tick = self.tick;

        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            let mut ticks = tokio::time::interval(tick);

            loop {
                let next = tokio::select! {
                    event = reader.next() => match event {
                        Some(Ok(event)) => translate(event),
                        Some(Err(e)) => {
                            tracing::warn!("terminal event stream failed: {e}");
                            break;
                        }
                        None => break,
                    },
                    _ = ticks.tick() => Some(TuiEvent::Tick),
                };
                if let Some(event) = next {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }
        });
    }

    pub fn draw<F>(&mut self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }

    /// Current terminal size in cells.
    pub fn size(&self) -> anyhow::Result<ratatui::layout::Size> {
        Ok(self.terminal.size()?)
    }
}
