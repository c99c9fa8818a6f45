// mpv-backed media element. One mpv process per loaded source, controlled
// over its JSON IPC socket. Process and socket work runs on tokio tasks;
// everything mpv reports comes back as actions on the app channel, and the
// app dispatches the resulting media events.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::ipc::{self, MpvProcess};
use crate::action::Action;
use crate::host::events::{Listener, ListenerId, Listeners};
use crate::host::media::{MediaElement, MediaEvent, PlaybackError};

pub struct MpvMedia {
    program: PathBuf,
    action_tx: Option<mpsc::UnboundedSender<Action>>,
    process: Option<MpvProcess>,
    socket_path: Option<PathBuf>,
    /// Commands for the running process, written in order by one task.
    commands: Option<mpsc::UnboundedSender<String>>,
    /// Bumped for every spawned process; reports from older ones are stale.
    generation: u64,
    src: Option<String>,
    paused: bool,
    position: f64,
    duration: Option<f64>,
    volume: f64,
    listeners: Listeners<MediaEvent>,
}

impl Default for MpvMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl MpvMedia {
    pub fn new() -> Self {
        Self::with_program("mpv")
    }

    /// Use a specific mpv binary instead of the one on PATH.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            action_tx: None,
            process: None,
            socket_path: None,
            commands: None,
            generation: 0,
            src: None,
            paused: true,
            position: 0.0,
            duration: None,
            volume: 1.0,
            listeners: Listeners::new(),
        }
    }

    pub fn set_action_tx(&mut self, tx: mpsc::UnboundedSender<Action>) {
        self.action_tx = Some(tx);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// IPC socket of the running process.
    pub fn socket_path(&self) -> Option<&Path> {
        self.socket_path.as_deref()
    }

    /// Record a position reported by mpv.
    pub fn update_position(&mut self, secs: f64) {
        if secs.is_finite() && secs >= 0.0 {
            self.position = secs;
        }
    }

    /// Record a duration reported by mpv.
    pub fn update_duration(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.duration = Some(secs);
        }
    }

    /// Queue an event for the app loop to dispatch.
    fn queue_event(&self, event: MediaEvent) {
        if let Some(tx) = &self.action_tx {
            tx.send(Action::Media(self.generation, event)).ok();
        }
    }

    fn socket_for(generation: u64) -> PathBuf {
        std::env::temp_dir().join(format!(
            "myplayer-mpv-{}-{}.sock",
            std::process::id(),
            generation
        ))
    }

    /// Start mpv on the current source, paused or not.
    fn spawn(&mut self, start_paused: bool) -> Result<(), PlaybackError> {
        let Some(src) = self.src.clone() else {
            return Err(PlaybackError::NoSource);
        };
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(PlaybackError::Backend("no async runtime".into()));
        }

        self.generation += 1;
        let socket_path = Self::socket_for(self.generation);
        let _ = std::fs::remove_file(&socket_path);

        let child = Command::new(&self.program)
            .arg("--no-video")
            .arg("--no-terminal")
            .arg("--idle=no")
            .arg(format!("--pause={}", if start_paused { "yes" } else { "no" }))
            .arg(format!("--volume={}", (self.volume * 100.0).round()))
            .arg("--af=@astats:lavfi=[astats=metadata=1:reset=1]")
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .arg(&src)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PlaybackError::Backend(e.to_string()))?;
        info!(generation = self.generation, src = %src, "mpv started");

        let process: MpvProcess = std::sync::Arc::new(tokio::sync::Mutex::new(Some(child)));
        let tx = self.action_tx.clone();
        ipc::spawn_exit_monitor(process.clone(), self.generation, tx.clone());
        ipc::spawn_position_poller(socket_path.clone(), self.generation, tx.clone());
        ipc::spawn_duration_poller(socket_path.clone(), self.generation, tx.clone());
        ipc::spawn_audio_level_poller(socket_path.clone(), tx);
        self.commands = Some(ipc::spawn_command_writer(socket_path.clone()));

        self.process = Some(process);
        self.socket_path = Some(socket_path);
        Ok(())
    }

    /// Kill the running process, if any. Its monitors see the cleared child
    /// and stop without reporting.
    pub fn stop(&mut self) {
        self.commands = None;
        if let Some(process) = self.process.take() {
            if tokio::runtime::Handle::try_current().is_ok() {
                tokio::spawn(async move {
                    let mut guard = process.lock().await;
                    if let Some(child) = guard.as_mut() {
                        let _ = child.start_kill();
                    }
                    *guard = None;
                });
            } else if let Ok(mut guard) = process.try_lock() {
                if let Some(child) = guard.as_mut() {
                    let _ = child.start_kill();
                }
                *guard = None;
            }
        }
        if let Some(socket) = self.socket_path.take() {
            let _ = std::fs::remove_file(socket);
        }
    }

    fn send(&self, cmd: String) {
        if let Some(commands) = &self.commands {
            commands.send(cmd).ok();
        }
    }
}

impl MediaElement for MpvMedia {
    fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn set_src(&mut self, url: &str) {
        self.src = Some(url.to_string());
    }

    fn load(&mut self) {
        let was_playing = !self.paused;
        self.stop();
        self.paused = true;
        self.position = 0.0;
        self.duration = None;
        // Start paused so duration is known before playback begins.
        let spawned = if self.src.is_some() {
            self.spawn(true)
        } else {
            Ok(())
        };
        // Queued after the spawn so the report carries the new generation.
        if was_playing {
            self.queue_event(MediaEvent::Pause);
        }
        if let Err(e) = spawned {
            warn!("failed to load media: {e}");
            self.queue_event(MediaEvent::Error(e.to_string()));
        }
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.src.is_none() {
            return Err(PlaybackError::NoSource);
        }
        if self.process.is_none() {
            self.spawn(false)?;
        } else {
            self.send(ipc::set_property_command("pause", serde_json::json!(false)));
        }
        self.paused = false;
        self.queue_event(MediaEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.send(ipc::set_property_command("pause", serde_json::json!(true)));
        self.paused = true;
        self.queue_event(MediaEvent::Pause);
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, secs: f64) {
        if !secs.is_finite() {
            return;
        }
        let secs = secs.max(0.0);
        self.position = secs;
        let cmd = serde_json::json!({ "command": ["seek", secs, "absolute"] }).to_string();
        self.send(cmd);
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.send(ipc::set_property_command(
            "volume",
            serde_json::json!((self.volume * 100.0).round()),
        ));
    }

    fn add_listener(&mut self, listener: Listener<MediaEvent>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(id);
    }

    fn listeners(&self) -> Vec<Listener<MediaEvent>> {
        self.listeners.snapshot()
    }

    fn apply_event(&mut self, event: &MediaEvent) {
        match event {
            MediaEvent::Ended => {
                self.paused = true;
                self.commands = None;
                if let Some(duration) = self.duration {
                    self.position = duration;
                }
                self.process = None;
                if let Some(socket) = self.socket_path.take() {
                    let _ = std::fs::remove_file(socket);
                }
            }
            MediaEvent::Error(_) => {
                self.paused = true;
                self.commands = None;
                self.process = None;
            }
            MediaEvent::Play => self.paused = false,
            MediaEvent::Pause => self.paused = true,
            MediaEvent::TimeUpdate | MediaEvent::LoadedMetadata => {}
        }
    }
}

impl Drop for MpvMedia {
    fn drop(&mut self) {
        if let Some(process) = self.process.take() {
            if let Ok(mut guard) = process.try_lock() {
                if let Some(child) = guard.as_mut() {
                    let _ = child.start_kill();
                }
                *guard = None;
            }
        }
        if let Some(socket) = self.socket_path.take() {
            let _ = std::fs::remove_file(socket);
        }
    }
}
