// Background duration lookup for tracks that haven't been played yet.
// ffprobe reads each file's container duration; results come back to the app
// as `Action::TrackDuration` so the track list can show them.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::action::Action;
use crate::library::Track;

/// Read a duration in seconds from ffprobe's bare `format=duration` output.
pub fn parse_duration(output: &str) -> Option<f64> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}

/// Tracks still missing a duration, as `(index, source)` pairs.
pub fn pending(tracks: &[Track]) -> Vec<(usize, String)> {
    tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.duration.filter(|d| *d > 0.0).is_none() && !t.audio_url.is_empty())
        .map(|(i, t)| (i, t.audio_url.clone()))
        .collect()
}

async fn lookup_one(program: &Path, src: &str) -> anyhow::Result<Option<f64>> {
    let output = Command::new(program)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(src)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await?;
    if !output.status.success() {
        return Ok(None);
    }
    Ok(parse_duration(&String::from_utf8_lossy(&output.stdout)))
}

/// Look up each track in turn. A program that can't be started ends the
/// whole run; a file it can't read is skipped.
pub fn spawn_duration_lookup(
    program: PathBuf,
    tracks: Vec<(usize, String)>,
    tx: mpsc::UnboundedSender<Action>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        for (index, src) in tracks {
            match lookup_one(&program, &src).await {
                Ok(Some(secs)) => {
                    if tx.send(Action::TrackDuration(index, secs)).is_err() {
                        break;
                    }
                }
                Ok(None) => debug!(index, src = %src, "no duration"),
                Err(e) => {
                    warn!("duration lookup stopped: {e}");
                    break;
                }
            }
        }
    })
}
