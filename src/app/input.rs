// Key event handling: maps key presses to actions.

use crate::action::Action;
use crate::app::App;
use crate::components::Component;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Seconds skipped by Left/Right.
const SEEK_STEP: f64 = 5.0;

impl App {
    pub fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<()> {
        use KeyCode::{Char, Left, Right};

        // The help overlay consumes all keys
        if self.show_help {
            self.action_tx.send(Action::HideHelp)?;
            return Ok(());
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == Char('c') {
            self.action_tx.send(Action::Quit)?;
            return Ok(());
        }

        // Cursor movement and Enter belong to the track list
        if self.track_list.handle_key_event(key)? {
            return Ok(());
        }

        let action = match key.code {
            Char('q') => Action::Quit,
            Char('?') => Action::ShowHelp,
            Char(' ') => Action::TogglePlayPause,
            Char('n') => Action::NextTrack,
            Char('p') => Action::PrevTrack,
            Left => Action::SeekRelative(-SEEK_STEP),
            Right => Action::SeekRelative(SEEK_STEP),
            Char('s') => Action::ToggleShuffle,
            Char('a') => Action::CycleArtistFilter,
            Char('b') => Action::CycleAlbumFilter,
            Char('c') => Action::ClearFilters,
            Char(']') => Action::VolumeUp,
            Char('[') => Action::VolumeDown,
            Char('v') => Action::ToggleVisualizer,
            Char('m') => Action::CycleVisualizerMode,
            Char('t') => Action::CycleVisualizerTheme,
            Char('+') | Char('=') => Action::SensitivityUp,
            Char('-') => Action::SensitivityDown,
            Char('>') | Char('.') => Action::SmoothingUp,
            Char('<') | Char(',') => Action::SmoothingDown,
            _ => return Ok(()),
        };
        self.action_tx.send(action)?;
        Ok(())
    }
}
