// Every user interaction, async result, and internal event is represented as an
// Action variant. The App event loop dispatches these to the player, the
// visualizer controls, and the UI.

use crate::host::media::MediaEvent;

/// All events flowing through the app. Media reports carry the mpv process
/// generation they came from so reports from a replaced process are dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,

    TogglePlayPause,
    NextTrack,
    PrevTrack,
    PlaySelected,
    SelectUp,
    SelectDown,
    SeekRelative(f64),
    VolumeUp,
    VolumeDown,
    ToggleShuffle,

    CycleArtistFilter,
    CycleAlbumFilter,
    ClearFilters,

    ToggleVisualizer,
    CycleVisualizerMode,
    CycleVisualizerTheme,
    SensitivityUp,
    SensitivityDown,
    SmoothingUp,
    SmoothingDown,

    Media(u64, MediaEvent),
    MediaPosition(u64, f64),
    MediaDuration(u64, f64),
    /// Length of a library track found at startup, by index.
    TrackDuration(usize, f64),
    AudioLevels {
        rms: f64,
        peak: f64,
    },

    FocusChanged(bool),
    ShowError(String),
    ClearError,
    ShowHelp,
    HideHelp,
    Tick,
}
