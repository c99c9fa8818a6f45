// Low-level mpv IPC: socket communication, and background tasks that turn
// mpv's state (exit, position, duration, audio levels) into actions.
//
// Every task is tagged with the generation of the mpv process it watches so
// the app can drop reports from a process that has since been replaced.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::Child;
use tokio::sync::mpsc;

use crate::action::Action;
use crate::host::media::MediaEvent;

pub type MpvProcess = std::sync::Arc<tokio::sync::Mutex<Option<Child>>>;

// How long to wait for mpv's IPC socket to appear (20 * 100ms = 2s).
const SOCKET_POLL_ATTEMPTS: u32 = 20;
const SOCKET_POLL_INTERVAL_MS: u64 = 100;
const POSITION_POLL_MS: u64 = 250;
const DURATION_POLL_MS: u64 = 200;
const LEVEL_POLL_MS: u64 = 50;
// Silence floor for dB-to-linear conversion.
const SILENCE_FLOOR_DB: f64 = -60.0;

/// Wait for the IPC socket to appear on disk (up to 2 seconds).
pub async fn wait_for_socket(path: &Path) {
    for _ in 0..SOCKET_POLL_ATTEMPTS {
        if path.exists() {
            return;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(SOCKET_POLL_INTERVAL_MS)).await;
    }
}

/// Send a single JSON command over a fresh IPC connection, return the response line.
pub async fn send_command(socket_path: &Path, cmd: &str) -> anyhow::Result<String> {
    let mut stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to mpv IPC socket: {}", e))?;
    let msg = format!("{}\n", cmd);
    stream.write_all(msg.as_bytes()).await?;
    let mut reader = BufReader::new(stream);
    let mut response = String::new();
    reader.read_line(&mut response).await?;
    Ok(response)
}

/// Read a numeric property, `None` when mpv has no value yet.
pub async fn get_f64_property(socket_path: &Path, property: &str) -> anyhow::Result<Option<f64>> {
    let cmd = serde_json::json!({ "command": ["get_property", property] }).to_string();
    let response = send_command(socket_path, &cmd).await?;
    let val: serde_json::Value = serde_json::from_str(&response)?;
    Ok(val.get("data").and_then(|d| d.as_f64()))
}

/// Write queued commands to the socket in order, once it exists. The task
/// ends when the sender is dropped.
pub fn spawn_command_writer(socket_path: PathBuf) -> mpsc::UnboundedSender<String> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        wait_for_socket(&socket_path).await;
        while let Some(cmd) = rx.recv().await {
            if let Err(e) = send_command(&socket_path, &cmd).await {
                tracing::warn!("mpv command failed: {e}");
            }
        }
    });
    tx
}

/// `{"command":[...]}` for a set_property call.
pub fn set_property_command(property: &str, value: serde_json::Value) -> String {
    serde_json::json!({ "command": ["set_property", property, value] }).to_string()
}

/// Poll the child process. A clean exit is the end of the track; any other
/// exit status is a media error. A child cleared by `stop` reports nothing.
pub fn spawn_exit_monitor(
    child: MpvProcess,
    generation: u64,
    tx: Option<mpsc::UnboundedSender<Action>>,
) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            let mut guard = child.lock().await;
            match guard.as_mut().and_then(|c| c.try_wait().ok()) {
                Some(Some(status)) => {
                    *guard = None;
                    let event = if status.success() {
                        MediaEvent::Ended
                    } else {
                        MediaEvent::Error(format!("mpv exited with {status}"))
                    };
                    if let Some(tx) = &tx {
                        tx.send(Action::Media(generation, event)).ok();
                    }
                    break;
                }
                Some(None) => {} // still running
                None => break,   // stopped, or wait error
            }
        }
    });
}

/// Poll playback-time and forward it as `MediaPosition`.
pub fn spawn_position_poller(
    socket_path: PathBuf,
    generation: u64,
    tx: Option<mpsc::UnboundedSender<Action>>,
) {
    tokio::spawn(async move {
        wait_for_socket(&socket_path).await;
        let mut last = None;
        loop {
            tokio::time::sleep(tokio::time::Duration::from_millis(POSITION_POLL_MS)).await;
            let Ok(position) = get_f64_property(&socket_path, "playback-time").await else {
                break;
            };
            if let Some(pos) = position {
                if last != Some(pos) {
                    last = Some(pos);
                    if let Some(tx) = &tx {
                        tx.send(Action::MediaPosition(generation, pos)).ok();
                    }
                }
            }
        }
    });
}

/// Poll `duration` until mpv knows it, report it once, then stop.
pub fn spawn_duration_poller(
    socket_path: PathBuf,
    generation: u64,
    tx: Option<mpsc::UnboundedSender<Action>>,
) {
    tokio::spawn(async move {
        wait_for_socket(&socket_path).await;
        loop {
            tokio::time::sleep(tokio::time::Duration::from_millis(DURATION_POLL_MS)).await;
            match get_f64_property(&socket_path, "duration").await {
                Ok(Some(duration)) if duration > 0.0 => {
                    if let Some(tx) = &tx {
                        tx.send(Action::MediaDuration(generation, duration)).ok();
                    }
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}

/// Poll audio levels at ~20 Hz via the astats lavfi filter.
pub fn spawn_audio_level_poller(socket_path: PathBuf, tx: Option<mpsc::UnboundedSender<Action>>) {
    tokio::spawn(async move {
        wait_for_socket(&socket_path).await;
        loop {
            tokio::time::sleep(tokio::time::Duration::from_millis(LEVEL_POLL_MS)).await;
            let Ok(response) = send_command(
                &socket_path,
                r#"{"command":["get_property","af-metadata/astats"]}"#,
            )
            .await
            else {
                break;
            };

            let Ok(val) = serde_json::from_str::<serde_json::Value>(&response) else {
                continue;
            };
            let Some(data) = val.get("data").and_then(|d| d.as_object()) else {
                continue;
            };

            let level = |key: &str| {
                data.get(key)
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse::<f64>().ok())
            };
            let rms_db = level("lavfi.astats.Overall.RMS_level");
            let peak_db = level("lavfi.astats.Overall.Peak_level");

            if let (Some(rms_db), Some(peak_db)) = (rms_db, peak_db) {
                if let Some(tx) = &tx {
                    tx.send(Action::AudioLevels {
                        rms: db_to_linear(rms_db),
                        peak: db_to_linear(peak_db),
                    })
                    .ok();
                }
            }
        }
    });
}

/// Convert decibels to a 0.0..=1.0 linear amplitude. Silence floor at -60 dB.
pub fn db_to_linear(db: f64) -> f64 {
    if db <= SILENCE_FLOOR_DB {
        0.0
    } else {
        10.0_f64.powf(db / 20.0).clamp(0.0, 1.0)
    }
}
