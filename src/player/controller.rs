// Playback controller: the filterable queue, shuffle with back-history, and
// the now-playing display model, driving one media element.
//
// `queue` is the ordered subset of track indices passing the active filters.
// `current_index` is always `None` or a member of `queue`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::host::events::ListenerId;
use crate::host::media::{MediaEvent, SharedMedia};
use crate::library::{format_time, Track};

/// Back-history entries kept for shuffle; the oldest is dropped first.
pub const HISTORY_LIMIT: usize = 50;
pub const DEFAULT_COVER: &str = "default-cover.png";
const NO_TRACK_TITLE: &str = "Select a track";
const UNKNOWN_TITLE: &str = "Unknown track";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterGroup {
    Artist,
    Album,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl Filters {
    pub fn matches(&self, track: &Track) -> bool {
        let matches = |wanted: &Option<String>, value: &str| {
            wanted.as_deref().map_or(true, |w| w == value)
        };
        matches(&self.artist, &track.artist) && matches(&self.album, &track.album)
    }
}

/// What the now-playing panel shows.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingView {
    pub title: String,
    /// "artist • album".
    pub meta: String,
    pub cover: String,
    pub elapsed: String,
    pub duration: String,
    /// 0.0..=100.0
    pub progress: f64,
}

impl NowPlayingView {
    fn empty(default_cover: &str) -> Self {
        Self {
            title: NO_TRACK_TITLE.to_string(),
            meta: String::new(),
            cover: default_cover.to_string(),
            elapsed: format_time(0.0),
            duration: format_time(0.0),
            progress: 0.0,
        }
    }
}

pub struct PlaybackController {
    tracks: Vec<Track>,
    visible: Vec<bool>,
    media: SharedMedia,
    rng: StdRng,

    current_index: Option<usize>,
    shuffle: bool,
    history: VecDeque<usize>,
    filters: Filters,
    queue: Vec<usize>,
    is_playing: bool,

    default_cover: String,
    display: NowPlayingView,
    listener: Option<ListenerId>,
}

impl PlaybackController {
    /// Build the queue and load its first entry without playing it.
    pub fn new(tracks: Vec<Track>, media: SharedMedia) -> Self {
        Self::with_rng(tracks, media, StdRng::from_os_rng())
    }

    pub fn with_rng(tracks: Vec<Track>, media: SharedMedia, rng: StdRng) -> Self {
        let visible = vec![true; tracks.len()];
        let mut controller = Self {
            tracks,
            visible,
            media,
            rng,
            current_index: None,
            shuffle: false,
            history: VecDeque::new(),
            filters: Filters::default(),
            queue: Vec::new(),
            is_playing: false,
            default_cover: DEFAULT_COVER.to_string(),
            display: NowPlayingView::empty(DEFAULT_COVER),
            listener: None,
        };
        controller.refresh_queue();
        match controller.queue.first().copied() {
            Some(first) => {
                controller.load_track(first, false, false);
            }
            None => controller.reset_display(),
        }
        controller
    }

    pub fn set_default_cover(&mut self, cover: &str) {
        self.default_cover = cover.to_string();
        if self.current_index.is_none() {
            self.reset_display();
        } else if let Some(track) = self.current_track() {
            if track.cover_url.is_none() {
                self.display.cover = cover.to_string();
            }
        }
    }

    /// Route the media element's events into `handle_media_event`.
    pub fn subscribe(this: &Rc<RefCell<Self>>) {
        let weak: Weak<RefCell<Self>> = Rc::downgrade(this);
        let media = Rc::clone(&this.borrow().media);
        let id = media.borrow_mut().add_listener(Rc::new(move |event: &MediaEvent| {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            match controller.try_borrow_mut() {
                Ok(mut controller) => controller.handle_media_event(event),
                Err(_) => warn!(?event, "media event dropped while controller is busy"),
            };
        }));
        this.borrow_mut().listener = Some(id);
    }

    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.listener.take() {
            self.media.borrow_mut().remove_listener(id);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn queue(&self) -> &[usize] {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.tracks.get(i))
    }

    pub fn history(&self) -> &VecDeque<usize> {
        &self.history
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn display(&self) -> &NowPlayingView {
        &self.display
    }

    pub fn volume_percent(&self) -> u8 {
        (self.media.borrow().volume() * 100.0).round().clamp(0.0, 100.0) as u8
    }

    // ── Queue and filters ────────────────────────────────────────────────────

    /// Recompute the queue from the currently visible tracks.
    pub fn refresh_queue(&mut self) {
        self.queue = (0..self.tracks.len())
            .filter(|&i| self.visible[i])
            .collect();
    }

    /// Set one filter (empty clears it), then stop if the current track fell
    /// out of the queue or the queue emptied.
    pub fn apply_filters(&mut self, group: FilterGroup, value: Option<&str>) {
        let value = value.filter(|v| !v.is_empty()).map(str::to_string);
        match group {
            FilterGroup::Artist => self.filters.artist = value,
            FilterGroup::Album => self.filters.album = value,
        }
        self.visible = self.tracks.iter().map(|t| self.filters.matches(t)).collect();
        self.refresh_queue();
        debug!(queue = self.queue.len(), filters = ?self.filters, "filters applied");

        if let Some(current) = self.current_index {
            if !self.is_visible(current) {
                self.media.borrow_mut().pause();
                self.current_index = None;
                self.set_playing(false);
                self.reset_display();
            }
        }
        if self.queue.is_empty() {
            self.media.borrow_mut().pause();
            self.current_index = None;
            self.set_playing(false);
            self.reset_display();
        }
    }

    // ── Transport ────────────────────────────────────────────────────────────

    /// Load a queued track. Returns `false` (and changes nothing) when the
    /// index is out of bounds or not in the queue.
    pub fn load_track(&mut self, index: usize, autoplay: bool, push_history: bool) -> bool {
        if index >= self.tracks.len() || !self.queue.contains(&index) {
            return false;
        }
        if push_history {
            if let Some(previous) = self.current_index.filter(|&c| c != index) {
                self.history.push_back(previous);
                while self.history.len() > HISTORY_LIMIT {
                    self.history.pop_front();
                }
            }
        }

        self.current_index = Some(index);
        let track = self.tracks[index].clone();
        {
            let mut media = self.media.borrow_mut();
            media.set_src(&track.audio_url);
            media.load();
        }
        self.update_display(&track);
        debug!(index, title = %track.title, autoplay, "track loaded");

        if autoplay {
            self.start_playback();
        }
        true
    }

    pub fn play_next(&mut self, autoplay: bool) {
        let Some(&first) = self.queue.first() else {
            return;
        };
        let Some(current) = self.current_index else {
            self.load_track(first, autoplay, true);
            return;
        };

        let next = if self.shuffle {
            let candidates: Vec<usize> =
                self.queue.iter().copied().filter(|&i| i != current).collect();
            if candidates.is_empty() {
                current
            } else {
                candidates[self.rng.random_range(0..candidates.len())]
            }
        } else {
            match self.queue.iter().position(|&i| i == current) {
                Some(pos) if pos + 1 < self.queue.len() => self.queue[pos + 1],
                _ => first,
            }
        };
        self.load_track(next, autoplay, true);
    }

    /// With shuffle on and history available this is a true "back": the most
    /// recent history entry is popped and the current track is not recorded.
    pub fn play_previous(&mut self) {
        let (Some(&first), Some(&last)) = (self.queue.first(), self.queue.last()) else {
            return;
        };
        if self.shuffle {
            if let Some(previous) = self.history.pop_back() {
                self.load_track(previous, true, false);
                return;
            }
        }
        let Some(current) = self.current_index else {
            self.load_track(first, false, false);
            return;
        };
        let previous = match self.queue.iter().position(|&i| i == current) {
            Some(pos) if pos > 0 => self.queue[pos - 1],
            _ => last,
        };
        self.load_track(previous, true, false);
    }

    pub fn toggle_play(&mut self) {
        if self.current_index.is_none() {
            if let Some(&first) = self.queue.first() {
                self.load_track(first, true, false);
            }
            return;
        }
        let paused = self.media.borrow().paused();
        if paused {
            self.start_playback();
        } else {
            self.media.borrow_mut().pause();
        }
    }

    /// A click on a track row. Re-selecting the current track reloads it and
    /// autoplays only if it was paused.
    pub fn select_track(&mut self, index: usize) -> bool {
        if !self.queue.contains(&index) {
            return false;
        }
        let autoplay = if self.current_index == Some(index) {
            self.media.borrow().paused()
        } else {
            true
        };
        self.load_track(index, autoplay, true)
    }

    /// Seek to a percentage of the known duration. No-op before metadata.
    pub fn seek_percent(&mut self, percent: f64) {
        let duration = self.media.borrow().duration();
        let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return;
        };
        let percent = if percent.is_finite() { percent } else { 0.0 };
        let target = percent.clamp(0.0, 100.0) / 100.0 * duration;
        self.media.borrow_mut().set_current_time(target);
    }

    /// Seek relative to the current position, clamped to the track.
    pub fn seek_relative(&mut self, secs: f64) {
        let (position, duration) = {
            let media = self.media.borrow();
            (media.current_time(), media.duration())
        };
        let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return;
        };
        let target = (position + secs).clamp(0.0, duration);
        self.media.borrow_mut().set_current_time(target);
    }

    pub fn set_volume_percent(&mut self, percent: f64) {
        let percent = if percent.is_finite() { percent } else { 0.0 };
        let volume = (percent / 100.0).clamp(0.0, 1.0);
        self.media.borrow_mut().set_volume(volume);
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle = enabled;
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    /// Record a looked-up duration for any track. Updates the duration label
    /// when it is the current track and the media hasn't reported one yet.
    pub fn set_track_duration(&mut self, index: usize, secs: f64) -> bool {
        if !secs.is_finite() || secs <= 0.0 {
            return false;
        }
        let Some(track) = self.tracks.get_mut(index) else {
            return false;
        };
        track.duration = Some(secs.round());
        let media_knows = self
            .media
            .borrow()
            .duration()
            .is_some_and(|d| d.is_finite() && d > 0.0);
        if self.current_index == Some(index) && !media_knows {
            self.display.duration = format_time(secs);
        }
        true
    }

    // ── Media events ─────────────────────────────────────────────────────────

    pub fn handle_media_event(&mut self, event: &MediaEvent) {
        match event {
            MediaEvent::Play => self.set_playing(true),
            MediaEvent::Pause => self.set_playing(false),
            MediaEvent::TimeUpdate => self.refresh_progress(),
            MediaEvent::LoadedMetadata => self.store_duration(),
            MediaEvent::Ended => self.play_next(true),
            MediaEvent::Error(message) => {
                warn!("media error: {message}");
                self.set_playing(false);
            }
        }
    }

    fn start_playback(&mut self) {
        let result = self.media.borrow_mut().play();
        if let Err(e) = result {
            warn!("playback rejected: {e}");
            self.set_playing(false);
        }
    }

    fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    fn refresh_progress(&mut self) {
        let (position, duration) = {
            let media = self.media.borrow();
            (media.current_time(), media.duration())
        };
        let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return;
        };
        self.display.elapsed = format_time(position);
        self.display.progress = (position / duration * 100.0).clamp(0.0, 100.0);
    }

    fn store_duration(&mut self) {
        let duration = self.media.borrow().duration();
        let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return;
        };
        if let Some(track) = self.current_index.and_then(|i| self.tracks.get_mut(i)) {
            track.duration = Some(duration.round());
        }
        self.display.duration = format_time(duration);
        self.display.progress = 0.0;
    }

    fn update_display(&mut self, track: &Track) {
        self.display = NowPlayingView {
            title: if track.title.trim().is_empty() {
                UNKNOWN_TITLE.to_string()
            } else {
                track.title.clone()
            },
            meta: track.meta_line(),
            cover: track
                .cover_url
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| self.default_cover.clone()),
            elapsed: format_time(0.0),
            duration: format_time(track.duration.filter(|d| *d > 0.0).unwrap_or(0.0)),
            progress: 0.0,
        };
    }

    fn reset_display(&mut self) {
        self.display = NowPlayingView::empty(&self.default_cover);
    }
}
