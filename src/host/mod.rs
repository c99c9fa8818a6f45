// Capabilities the core consumes from its host. Everything the visualizer
// and the playback controller touch outside plain memory goes through one of
// these traits, so the terminal app and the tests plug in their own.

pub mod audio;
pub mod events;
pub mod media;
pub mod page;
pub mod scheduler;

pub use audio::{AnalyserNode, AudioContext, AudioHost, HostError, NullAudioHost, SourceNode};
pub use events::{Listener, ListenerId, Listeners};
pub use media::{dispatch_media_event, MediaElement, MediaEvent, PlaybackError, SharedMedia};
pub use page::{dispatch_page_event, PageEvent, PageHost, SharedPage};
pub use scheduler::{FrameCallback, FrameHandle, FrameScheduler};
