// Track list parsing, time formatting, filter helpers, and config loading.

use std::path::Path;

use myplayer::config::Config;
use myplayer::library::{self, Track};
use myplayer::visualizer::settings::DEFAULT_STORAGE_KEY;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn tracks() -> Vec<Track> {
    vec![
        Track::new("Intro", "Nova", "First Light", "intro.mp3"),
        Track::new("Harbor", "Tide", "Low Water", "harbor.mp3"),
        Track::new("Ember", "Nova", "Static", "ember.mp3"),
        Track::new("Loose", "  ", "", "loose.mp3"),
    ]
}

// ── Track list ───────────────────────────────────────────────────────────────

#[test]
fn test_parse_tracks_reads_camel_case_fields() {
    let parsed = library::parse_tracks(
        r#"[{"title":"Drift","artist":"Nova","album":"First Light",
             "audioUrl":"tracks/drift.mp3","coverUrl":"covers/drift.jpg"}]"#,
    );
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].audio_url, "tracks/drift.mp3");
    assert_eq!(parsed[0].cover_url.as_deref(), Some("covers/drift.jpg"));
    assert_eq!(parsed[0].duration, None);
}

#[test]
fn test_parse_tracks_skips_entries_without_audio() {
    let parsed = library::parse_tracks(
        r#"[{"title":"No audio"},{"audioUrl":"a.mp3"},42]"#,
    );
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].title, "");
    assert_eq!(parsed[0].audio_url, "a.mp3");
}

#[test]
fn test_parse_tracks_non_array_is_empty() {
    assert!(library::parse_tracks(r#"{"audioUrl":"a.mp3"}"#).is_empty());
    assert!(library::parse_tracks("not json").is_empty());
}

#[test]
fn test_load_tracks_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracks.json");
    std::fs::write(&path, r#"[{"title":"Signal","audioUrl":"signal.mp3"}]"#).unwrap();
    let loaded = library::load_tracks(&path).unwrap();
    assert_eq!(loaded[0].title, "Signal");

    assert!(library::load_tracks(&dir.path().join("missing.json")).is_err());
}

#[test]
fn test_track_from_path_uses_stem_and_folder() {
    let track = Track::from_path(Path::new("/music/Low Water/Harbor.flac"));
    assert_eq!(track.title, "Harbor");
    assert_eq!(track.album, "Low Water");
    assert_eq!(track.artist, "");
    assert_eq!(track.audio_url, "/music/Low Water/Harbor.flac");

    let all = library::from_paths(&["a.mp3", "b.mp3"]);
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].title, "b");
}

#[test]
fn test_meta_line_variants() {
    assert_eq!(tracks()[0].meta_line(), "Nova • First Light");
    assert_eq!(Track::new("t", "Nova", "", "x").meta_line(), "Nova");
    assert_eq!(Track::new("t", "", "Static", "x").meta_line(), "Static");
    assert_eq!(tracks()[3].meta_line(), "");
}

// ── Formatting and filters ───────────────────────────────────────────────────

#[test]
fn test_format_time() {
    assert_eq!(library::format_time(0.0), "0:00");
    assert_eq!(library::format_time(59.9), "0:59");
    assert_eq!(library::format_time(187.6), "3:07");
    assert_eq!(library::format_time(3600.0), "60:00");
    assert_eq!(library::format_time(-4.0), "0:00");
    assert_eq!(library::format_time(f64::NAN), "0:00");
}

#[test]
fn test_distinct_values_sorted_and_non_empty() {
    let artists = library::distinct_values(&tracks(), |t| &t.artist);
    assert_eq!(artists, vec!["Nova", "Tide"]);
    let albums = library::distinct_values(&tracks(), |t| &t.album);
    assert_eq!(albums, vec!["First Light", "Low Water", "Static"]);
}

#[test]
fn test_next_filter_value_cycles_through_all() {
    let values = vec!["Nova".to_string(), "Tide".to_string()];
    assert_eq!(library::next_filter_value(&values, None).as_deref(), Some("Nova"));
    assert_eq!(
        library::next_filter_value(&values, Some("Nova")).as_deref(),
        Some("Tide")
    );
    assert_eq!(library::next_filter_value(&values, Some("Tide")), None);
    assert_eq!(
        library::next_filter_value(&values, Some("Gone")).as_deref(),
        Some("Nova")
    );
    assert_eq!(library::next_filter_value(&[], None), None);
}

// ── Config ───────────────────────────────────────────────────────────────────

#[test]
fn test_config_defaults_when_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
    assert_eq!(config.general.frame_rate, 30.0);
    assert!(config.general.frame_sync);
    assert_eq!(config.visualizer.storage_key, DEFAULT_STORAGE_KEY);
    assert_eq!(config.player.volume, 80);
    assert!(config.player.tracks.is_none());
    assert!(config.player.lookup_durations);
}

#[test]
fn test_config_parses_sections() {
    let config = Config::parse(
        r#"
[general]
frame_sync = false

[player]
volume = 55
tracks = "/music/tracks.json"
lookup_durations = false

[metadata]
endpoint = "http://localhost:8000/guess"
"#,
    )
    .unwrap();
    assert!(!config.general.frame_sync);
    assert_eq!(config.general.frame_rate, 30.0);
    assert_eq!(config.player.volume, 55);
    assert!(!config.player.lookup_durations);
    assert_eq!(
        config.player.tracks.as_deref(),
        Some(Path::new("/music/tracks.json"))
    );
    assert_eq!(config.metadata.endpoint, "http://localhost:8000/guess");
}

#[test]
fn test_config_invalid_toml_is_error() {
    assert!(Config::parse("[general\nframe_rate = ").is_err());
}

#[test]
fn test_config_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[visualizer]\nstorage_key = \"custom\"\n\n[visualizer.defaults]\nmode = \"wave\"\nsensitivity = 1.4\n",
    )
    .unwrap();
    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.visualizer.storage_key, "custom");
    assert_eq!(config.visualizer.defaults.mode.as_deref(), Some("wave"));
    assert_eq!(config.visualizer.defaults.sensitivity, Some(1.4));
    assert_eq!(config.visualizer.defaults.enabled, None);
}
