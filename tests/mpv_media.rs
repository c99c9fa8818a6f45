// mpv media element state handling that needs no mpv binary, plus the IPC
// helpers that shape commands and levels.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::mpsc;

use myplayer::action::Action;
use myplayer::host::{dispatch_media_event, MediaElement, MediaEvent, PlaybackError, SharedMedia};
use myplayer::player::ipc;
use myplayer::player::MpvMedia;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn wired() -> (MpvMedia, mpsc::UnboundedReceiver<Action>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut media = MpvMedia::new();
    media.set_action_tx(tx);
    (media, rx)
}

/// A stand-in mpv that just stays alive; the test plays the IPC side.
fn fake_mpv(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("mpv");
    std::fs::write(&path, "#!/bin/sh\nexec sleep 5\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Accept IPC connections until `window` elapses, recording one command per
/// connection and answering each with an empty success.
async fn collect_commands(listener: UnixListener, window: Duration) -> Vec<String> {
    let mut received = Vec::new();
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(Ok((stream, _))) = tokio::time::timeout_at(deadline, listener.accept()).await {
        let (read, mut write) = stream.into_split();
        let mut line = String::new();
        if BufReader::new(read).read_line(&mut line).await.is_ok() {
            received.push(line.trim().to_string());
        }
        write
            .write_all(b"{\"data\":null,\"error\":\"success\"}\n")
            .await
            .ok();
    }
    received
}

// ── Element state ────────────────────────────────────────────────────────────

#[test]
fn test_new_element_is_paused_and_empty() {
    let media = MpvMedia::new();
    assert!(media.paused());
    assert_eq!(media.src(), None);
    assert_eq!(media.current_time(), 0.0);
    assert_eq!(media.duration(), None);
    assert_eq!(media.volume(), 1.0);
    assert_eq!(media.generation(), 0);
    assert!(media.is_current(0));
}

#[test]
fn test_play_without_source_is_rejected() {
    let (mut media, mut rx) = wired();
    assert!(matches!(media.play(), Err(PlaybackError::NoSource)));
    assert!(media.paused());
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_load_without_runtime_reports_error() {
    let (mut media, mut rx) = wired();
    media.set_src("tracks/drift.mp3");
    media.load();
    assert_eq!(media.generation(), 0);
    match rx.try_recv() {
        Ok(Action::Media(0, MediaEvent::Error(message))) => {
            assert!(message.contains("no async runtime"));
        }
        other => panic!("expected media error, got {other:?}"),
    }
}

#[test]
fn test_play_without_runtime_is_backend_error() {
    let (mut media, _rx) = wired();
    media.set_src("tracks/drift.mp3");
    assert!(matches!(media.play(), Err(PlaybackError::Backend(_))));
    assert!(media.paused());
}

#[test]
fn test_pause_when_paused_queues_nothing() {
    let (mut media, mut rx) = wired();
    media.pause();
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_volume_and_seek_are_sanitized() {
    let mut media = MpvMedia::new();
    media.set_volume(1.7);
    assert_eq!(media.volume(), 1.0);
    media.set_volume(f64::NAN);
    assert_eq!(media.volume(), 1.0);
    media.set_volume(0.25);
    assert_eq!(media.volume(), 0.25);

    media.set_current_time(-5.0);
    assert_eq!(media.current_time(), 0.0);
    media.set_current_time(42.0);
    assert_eq!(media.current_time(), 42.0);
    media.set_current_time(f64::INFINITY);
    assert_eq!(media.current_time(), 42.0);
}

#[test]
fn test_reported_position_and_duration() {
    let mut media = MpvMedia::new();
    media.update_duration(0.0);
    assert_eq!(media.duration(), None);
    media.update_duration(212.5);
    media.update_position(30.0);
    media.update_position(-1.0);
    assert_eq!(media.duration(), Some(212.5));
    assert_eq!(media.current_time(), 30.0);
}

#[test]
fn test_dispatched_events_update_state_before_listeners() {
    let mut element = MpvMedia::new();
    element.update_duration(100.0);
    let media: SharedMedia = Rc::new(RefCell::new(element));

    let saw_paused_end = Rc::new(Cell::new(false));
    let seen = Rc::clone(&saw_paused_end);
    let m = Rc::clone(&media);
    media.borrow_mut().add_listener(Rc::new(move |event: &MediaEvent| {
        if *event == MediaEvent::Ended {
            let element = m.borrow();
            seen.set(element.paused() && element.current_time() == 100.0);
        }
    }));

    dispatch_media_event(&media, &MediaEvent::Play);
    assert!(!media.borrow().paused());
    dispatch_media_event(&media, &MediaEvent::Ended);
    assert!(saw_paused_end.get());
}

// ── IPC delivery ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_commands_wait_for_late_socket_and_keep_order() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut media = MpvMedia::with_program(fake_mpv(dir.path()));
    media.set_action_tx(tx);

    media.set_src("tracks/drift.mp3");
    media.load();
    media.play().unwrap();
    media.pause();
    media.play().unwrap();
    assert!(!media.paused());
    let socket = media.socket_path().expect("socket for spawned mpv").to_path_buf();

    // mpv only creates its socket some time after starting.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let listener = UnixListener::bind(&socket).unwrap();
    let received = collect_commands(listener, Duration::from_millis(1500)).await;

    let pause_commands: Vec<&str> = received
        .iter()
        .map(String::as_str)
        .filter(|c| c.contains(r#""set_property","pause""#))
        .collect();
    assert_eq!(
        pause_commands,
        vec![
            r#"{"command":["set_property","pause",false]}"#,
            r#"{"command":["set_property","pause",true]}"#,
            r#"{"command":["set_property","pause",false]}"#,
        ]
    );
}

#[tokio::test]
async fn test_missing_binary_reports_load_error() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut media = MpvMedia::with_program("/nonexistent/mpv");
    media.set_action_tx(tx);
    media.set_src("tracks/drift.mp3");
    media.load();
    assert!(media.socket_path().is_none());
    assert!(matches!(
        rx.try_recv(),
        Ok(Action::Media(_, MediaEvent::Error(_)))
    ));
}

// ── IPC helpers ──────────────────────────────────────────────────────────────

#[test]
fn test_set_property_command_shape() {
    let cmd = ipc::set_property_command("pause", serde_json::json!(true));
    let value: serde_json::Value = serde_json::from_str(&cmd).unwrap();
    assert_eq!(value["command"], serde_json::json!(["set_property", "pause", true]));
}

#[test]
fn test_db_to_linear() {
    assert_eq!(ipc::db_to_linear(-60.0), 0.0);
    assert_eq!(ipc::db_to_linear(-90.0), 0.0);
    assert!((ipc::db_to_linear(0.0) - 1.0).abs() < 1e-9);
    assert!((ipc::db_to_linear(-20.0) - 0.1).abs() < 1e-9);
    assert_eq!(ipc::db_to_linear(6.0), 1.0);
}
