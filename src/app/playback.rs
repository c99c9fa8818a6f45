// Playback handlers: transport, filters, and the media backend's reports.

use tracing::debug;

use crate::action::Action;
use crate::app::App;
use crate::host::{dispatch_media_event, MediaEvent};
use crate::library::{distinct_values, next_filter_value};
use crate::player::{lookup, FilterGroup};

impl App {
    pub(crate) fn play_selected(&mut self) {
        if let Some(index) = self.track_list.selected_track() {
            self.controller.borrow_mut().select_track(index);
        }
    }

    pub(crate) fn adjust_volume(&mut self, delta: f64) {
        let mut controller = self.controller.borrow_mut();
        let volume = f64::from(controller.volume_percent());
        controller.set_volume_percent(volume + delta);
    }

    /// Step one filter through "all" and each distinct value in turn.
    pub(crate) fn cycle_filter(&mut self, group: FilterGroup) {
        let mut controller = self.controller.borrow_mut();
        let next = {
            let tracks = controller.tracks();
            let filters = controller.filters();
            match group {
                FilterGroup::Artist => next_filter_value(
                    &distinct_values(tracks, |t| t.artist.as_str()),
                    filters.artist.as_deref(),
                ),
                FilterGroup::Album => next_filter_value(
                    &distinct_values(tracks, |t| t.album.as_str()),
                    filters.album.as_deref(),
                ),
            }
        };
        controller.apply_filters(group, next.as_deref());
    }

    pub(crate) fn clear_filters(&mut self) {
        let mut controller = self.controller.borrow_mut();
        controller.apply_filters(FilterGroup::Artist, None);
        controller.apply_filters(FilterGroup::Album, None);
    }

    fn is_current(&self, generation: u64) -> bool {
        let current = self.media.borrow().is_current(generation);
        if !current {
            debug!(generation, "dropping report from a replaced mpv process");
        }
        current
    }

    pub(crate) fn handle_media_report(
        &mut self,
        generation: u64,
        event: MediaEvent,
    ) -> anyhow::Result<()> {
        if !self.is_current(generation) {
            return Ok(());
        }
        if let MediaEvent::Error(ref message) = event {
            self.action_tx
                .send(Action::ShowError(format!("Playback failed: {message}")))?;
        }
        dispatch_media_event(&self.shared_media, &event);
        Ok(())
    }

    pub(crate) fn handle_position(&mut self, generation: u64, secs: f64) {
        if !self.is_current(generation) {
            return;
        }
        self.media.borrow_mut().update_position(secs);
        dispatch_media_event(&self.shared_media, &MediaEvent::TimeUpdate);
    }

    pub(crate) fn handle_duration(&mut self, generation: u64, secs: f64) {
        if !self.is_current(generation) {
            return;
        }
        self.media.borrow_mut().update_duration(secs);
        dispatch_media_event(&self.shared_media, &MediaEvent::LoadedMetadata);
    }

    /// Look up durations for tracks that don't carry one, when ffprobe is
    /// available.
    pub(crate) fn start_duration_lookup(&self) {
        if !self.config.player.lookup_durations {
            return;
        }
        let pending = lookup::pending(self.controller.borrow().tracks());
        if pending.is_empty() {
            return;
        }
        match which::which("ffprobe") {
            Ok(program) => {
                debug!(tracks = pending.len(), "probing track durations");
                lookup::spawn_duration_lookup(program, pending, self.action_tx.clone());
            }
            Err(_) => debug!("ffprobe not found, durations fill in as tracks play"),
        }
    }
}
