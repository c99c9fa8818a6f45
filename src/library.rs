// Track list: the model the playback controller walks, loaded from a JSON
// file or built from audio file paths given on the command line.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// One playable track as supplied by the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    pub audio_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Seconds; filled in once the media reports its length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Track {
    pub fn new(title: &str, artist: &str, album: &str, audio_url: &str) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            audio_url: audio_url.to_string(),
            cover_url: None,
            duration: None,
        }
    }

    /// Build a track from a local file, using the file stem as the title.
    pub fn from_path(path: &Path) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let album = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            title,
            artist: String::new(),
            album,
            audio_url: path.to_string_lossy().into_owned(),
            cover_url: None,
            duration: None,
        }
    }

    /// "artist • album", or whichever of the two is present.
    pub fn meta_line(&self) -> String {
        let artist = self.artist.trim();
        let album = self.album.trim();
        match (artist.is_empty(), album.is_empty()) {
            (false, false) => format!("{artist} • {album}"),
            (false, true) => artist.to_string(),
            (true, false) => album.to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Parse a JSON track list. Anything other than an array yields no tracks;
/// entries that don't decode are skipped.
pub fn parse_tracks(json: &str) -> Vec<Track> {
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Track>(item) {
                Ok(track) => Some(track),
                Err(e) => {
                    tracing::warn!("skipping malformed track entry: {e}");
                    None
                }
            })
            .collect(),
        Ok(_) => {
            tracing::warn!("track list is not a JSON array");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("failed to parse track list: {e}");
            Vec::new()
        }
    }
}

pub fn load_tracks(path: &Path) -> anyhow::Result<Vec<Track>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read track list {}", path.display()))?;
    Ok(parse_tracks(&content))
}

pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<Track> {
    paths.iter().map(|p| Track::from_path(p.as_ref())).collect()
}

/// `m:ss`. Negative or non-finite input is `0:00`.
pub fn format_time(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "0:00".to_string();
    }
    let total = secs.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Sorted, de-duplicated non-empty values of one field, for filter choices.
pub fn distinct_values<F>(tracks: &[Track], field: F) -> Vec<String>
where
    F: Fn(&Track) -> &str,
{
    let mut values: Vec<String> = tracks
        .iter()
        .map(|t| field(t).trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    values.sort();
    values.dedup();
    values
}

/// The filter choice after `current`: "all" (`None`) steps to the first
/// value and the last value steps back to "all".
pub fn next_filter_value(values: &[String], current: Option<&str>) -> Option<String> {
    let next = match current.and_then(|c| values.iter().position(|v| v == c)) {
        Some(pos) => values.get(pos + 1),
        None => values.first(),
    };
    next.cloned()
}
