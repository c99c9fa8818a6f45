// Metadata inference client and the form model it fills in.
//
// A new request aborts the one in flight (`GuessSlot`), and the result of an
// aborted request is dropped without touching the form.

use std::future::Future;
use std::path::Path;

use anyhow::Context;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use super::models::GuessResponse;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/track/metadata/guess";
pub const DEFAULT_FEEDBACK: &str = "Pick an audio file to fill in the fields automatically.";
pub const DETECTING_FEEDBACK: &str = "Detecting metadata...";
pub const FAILURE_FEEDBACK: &str = "Could not read metadata. Fill in the fields manually.";

#[derive(Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    endpoint: String,
}

impl MetadataClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload a local audio file and decode the guess.
    pub async fn guess_file(&self, path: &Path) -> anyhow::Result<GuessResponse> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        self.guess(&file_name, bytes).await
    }

    /// POST the payload as multipart field `audio`. Non-2xx statuses and
    /// bodies that aren't JSON objects are errors.
    pub async fn guess(&self, file_name: &str, bytes: Vec<u8>) -> anyhow::Result<GuessResponse> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("audio", part);

        let resp = self
            .http
            .post(&self.endpoint)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("request failed with status {status}");
        }

        let body: serde_json::Value = resp.json().await?;
        if !body.is_object() {
            anyhow::bail!("invalid server response");
        }
        let guess: GuessResponse = serde_json::from_value(body)?;
        debug!(success = guess.success, has_metadata = guess.has_metadata, "metadata guess");
        Ok(guess)
    }
}

// ── Cancel-in-flight ─────────────────────────────────────────────────────────

/// Holds at most one running guess per form.
#[derive(Default)]
pub struct GuessSlot {
    generation: u64,
    in_flight: Option<AbortHandle>,
}

/// A started request. `wait` yields `None` when it was superseded.
pub struct GuessTicket {
    pub generation: u64,
    handle: JoinHandle<anyhow::Result<GuessResponse>>,
}

impl GuessTicket {
    pub async fn wait(self) -> Option<anyhow::Result<GuessResponse>> {
        match self.handle.await {
            Ok(result) => Some(result),
            Err(e) if e.is_cancelled() => None,
            Err(e) => Some(Err(anyhow::anyhow!("metadata request task failed: {e}"))),
        }
    }
}

impl GuessSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort whatever is running and start `request`.
    pub fn start<F>(&mut self, request: F) -> GuessTicket
    where
        F: Future<Output = anyhow::Result<GuessResponse>> + Send + 'static,
    {
        self.abort();
        self.generation += 1;
        let handle = tokio::spawn(request);
        self.in_flight = Some(handle.abort_handle());
        GuessTicket {
            generation: self.generation,
            handle,
        }
    }

    pub fn abort(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            debug!(generation = self.generation, "aborting metadata request");
            handle.abort();
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Mark a request as finished; clears the slot if it is the latest.
    pub fn settle(&mut self, generation: u64) {
        if self.is_current(generation) {
            self.in_flight = None;
        }
    }
}

// ── Form model ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Artist,
    Album,
    Genre,
}

impl FormField {
    pub const ALL: [FormField; 4] = [Self::Title, Self::Artist, Self::Album, Self::Genre];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldState {
    pub value: String,
    /// Set when the value came from a guess; cleared by a manual edit.
    pub autofilled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackTone {
    Success,
    Muted,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub message: String,
    pub tone: FeedbackTone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackForm {
    pub title: FieldState,
    pub artist: FieldState,
    pub album: FieldState,
    pub genre: FieldState,
    pub feedback: Feedback,
    #[serde(skip)]
    default_feedback: String,
}

impl Default for TrackForm {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK)
    }
}

impl TrackForm {
    pub fn new(default_feedback: &str) -> Self {
        Self {
            title: FieldState::default(),
            artist: FieldState::default(),
            album: FieldState::default(),
            genre: FieldState::default(),
            feedback: Feedback {
                message: default_feedback.to_string(),
                tone: FeedbackTone::Muted,
            },
            default_feedback: default_feedback.to_string(),
        }
    }

    pub fn field(&self, field: FormField) -> &FieldState {
        match field {
            FormField::Title => &self.title,
            FormField::Artist => &self.artist,
            FormField::Album => &self.album,
            FormField::Genre => &self.genre,
        }
    }

    fn field_mut(&mut self, field: FormField) -> &mut FieldState {
        match field {
            FormField::Title => &mut self.title,
            FormField::Artist => &mut self.artist,
            FormField::Album => &mut self.album,
            FormField::Genre => &mut self.genre,
        }
    }

    /// A manual edit: the field is no longer considered autofilled.
    pub fn edit(&mut self, field: FormField, value: &str) {
        let state = self.field_mut(field);
        state.value = value.to_string();
        state.autofilled = false;
    }

    /// Apply a guessed value. Blank guesses are ignored, and a field the
    /// user filled in by hand is left alone.
    pub fn apply_value(&mut self, field: FormField, value: Option<&str>) {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return;
        };
        let state = self.field_mut(field);
        if state.value.trim().is_empty() || state.autofilled {
            state.value = value.to_string();
            state.autofilled = true;
        }
    }

    /// Empty messages fall back to the form's default text.
    pub fn set_feedback(&mut self, message: &str, tone: FeedbackTone) {
        let message = if message.trim().is_empty() {
            self.default_feedback.clone()
        } else {
            message.to_string()
        };
        self.feedback = Feedback { message, tone };
    }

    /// The file input was cleared.
    pub fn clear_file(&mut self) {
        let default = self.default_feedback.clone();
        self.set_feedback(&default, FeedbackTone::Muted);
    }

    pub fn begin_guess(&mut self) {
        self.set_feedback(DETECTING_FEEDBACK, FeedbackTone::Muted);
    }

    pub fn apply_response(&mut self, response: &GuessResponse) {
        if !response.success {
            self.set_feedback(&response.message, FeedbackTone::Error);
            return;
        }
        if let Some(data) = &response.data {
            self.apply_value(FormField::Title, data.title.as_deref());
            self.apply_value(FormField::Artist, data.artist.as_deref());
            self.apply_value(FormField::Album, data.album.as_deref());
            self.apply_value(FormField::Genre, data.genre.as_deref());
        }
        let tone = if response.has_metadata {
            FeedbackTone::Success
        } else {
            FeedbackTone::Muted
        };
        self.set_feedback(&response.message, tone);
    }

    pub fn apply_failure(&mut self, error: &anyhow::Error) {
        warn!("metadata request failed: {error:#}");
        self.set_feedback(FAILURE_FEEDBACK, FeedbackTone::Error);
    }

    /// Fold one finished request into the form. `None` (aborted) changes
    /// nothing.
    pub fn apply_outcome(&mut self, outcome: Option<anyhow::Result<GuessResponse>>) {
        match outcome {
            Some(Ok(response)) => self.apply_response(&response),
            Some(Err(e)) => self.apply_failure(&e),
            None => {}
        }
    }
}
