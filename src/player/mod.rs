// Playback: the queue/shuffle controller and the mpv media element it drives.

pub mod controller;
pub mod ipc;
pub mod mpv;
pub mod lookup;

pub use controller::{FilterGroup, Filters, NowPlayingView, PlaybackController, HISTORY_LIMIT};
pub use mpv::MpvMedia;
