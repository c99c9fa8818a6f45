// Media element boundary: the playable audio source that both the playback
// controller and the visualizer engine observe.

use std::cell::RefCell;
use std::rc::Rc;

use super::events::{Listener, ListenerId};

/// Notifications a media element delivers to its listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Play,
    Pause,
    TimeUpdate,
    LoadedMetadata,
    Ended,
    Error(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("no media source assigned")]
    NoSource,

    #[error("playback was rejected: {0}")]
    Rejected(String),

    #[error("failed to start media backend: {0}")]
    Backend(String),
}

/// An audio element: source, transport, position and volume, plus event
/// subscription.
///
/// Implementations never invoke listeners from inside their own methods.
/// Events are delivered afterwards through [`dispatch_media_event`], so a
/// listener is free to borrow the element again.
pub trait MediaElement {
    fn src(&self) -> Option<&str>;
    fn set_src(&mut self, url: &str);
    /// Reset the element and start fetching the current source.
    fn load(&mut self);
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, secs: f64);
    /// Total length in seconds, `None` until metadata is known.
    fn duration(&self) -> Option<f64>;
    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);

    fn add_listener(&mut self, listener: Listener<MediaEvent>) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);
    fn listeners(&self) -> Vec<Listener<MediaEvent>>;

    /// Fold an incoming event into cached element state before listeners
    /// see it (e.g. `Ended` leaves the element paused).
    fn apply_event(&mut self, event: &MediaEvent) {
        let _ = event;
    }
}

pub type SharedMedia = Rc<RefCell<dyn MediaElement>>;

/// Deliver one event: update element state, release the borrow, then run
/// every listener in registration order.
pub fn dispatch_media_event(media: &SharedMedia, event: &MediaEvent) {
    let listeners = {
        let mut element = media.borrow_mut();
        element.apply_event(event);
        element.listeners()
    };
    for listener in listeners {
        listener(event);
    }
}
