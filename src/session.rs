//! Conversation state for the chat screen
//!
//! `ChatSession` owns the message log and the composer state. Sending is split
//! in two so a UI can release its borrow while the completion call is awaited:
//! [`ChatSession::begin_send`] validates and records the user's message, and
//! [`ChatSession::finish_send`] records the reply (or the failure).

use crate::ai::{ChatError, CompletionBackend, CompletionRequest, Readiness};
use crate::types::{ImageAttachment, MediaKind, MessageRecord, Sender};
use crate::voice::{AudioCapture, CaptureError, placeholder_transcript};

pub const NOT_READY_NOTICE: &str =
    "Hold on, the AI service is still loading. I'll be ready to help in a moment!";

/// Why a send did not go out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("nothing to send")]
    EmptyInput,

    #[error("a reply is still pending")]
    Busy,

    #[error("no API key configured")]
    MissingCredential,

    #[error("the AI service is not ready yet")]
    NotReady,
}

/// A user message that has been recorded and is waiting for its reply.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingRequest {
    pub prompt: String,
    pub image: Option<ImageAttachment>,
    pub model: String,
}

impl PendingRequest {
    pub fn into_completion(
        self,
        system_prompt: &str,
        credential: Option<&str>,
    ) -> CompletionRequest {
        CompletionRequest {
            model: self.model,
            system_prompt: system_prompt.to_string(),
            prompt: self.prompt,
            image: self.image,
            credential: credential.map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatSession {
    messages: Vec<MessageRecord>,
    input: String,
    pending_image: Option<ImageAttachment>,
    pending_voice: bool,
    loading: bool,
    recording: bool,
    model: String,
}

impl ChatSession {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            pending_image: None,
            pending_voice: false,
            loading: false,
            recording: false,
            model: model.into(),
        }
    }

    pub fn messages(&self) -> &[MessageRecord] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        if self.input.trim().is_empty() {
            self.pending_voice = false;
        }
    }

    pub fn pending_image(&self) -> Option<&ImageAttachment> {
        self.pending_image.as_ref()
    }

    pub fn attach_image(&mut self, image: ImageAttachment) {
        tracing::debug!(file = %image.file_name, mime = %image.mime, "image attached");
        self.pending_image = Some(image);
    }

    pub fn detach_image(&mut self) {
        self.pending_image = None;
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn select_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Whether the send control should be enabled.
    pub fn can_send(&self) -> bool {
        !self.loading && (!self.input.trim().is_empty() || self.pending_image.is_some())
    }

    /// Validate the composer and record the user's message.
    ///
    /// Pass `credential: None` for backends that need no key; a blank key is rejected.
    pub fn begin_send(
        &mut self,
        credential: Option<&str>,
        readiness: Readiness,
    ) -> Result<PendingRequest, SendRejected> {
        let prompt = self.input.trim().to_string();
        if prompt.is_empty() && self.pending_image.is_none() {
            return Err(SendRejected::EmptyInput);
        }
        if self.loading {
            return Err(SendRejected::Busy);
        }
        if credential.is_some_and(|key| key.trim().is_empty()) {
            return Err(SendRejected::MissingCredential);
        }
        if readiness == Readiness::Pending {
            self.push(MessageRecord::new(Sender::Assistant, NOT_READY_NOTICE));
            return Err(SendRejected::NotReady);
        }

        let image = self.pending_image.take();
        let mut record = MessageRecord::new(Sender::User, prompt.clone()).with_model(&self.model);
        if let Some(image) = image.clone() {
            record = record.with_image(image);
        } else if self.pending_voice {
            record = record.with_media(MediaKind::Voice);
        }
        self.push(record);

        self.input.clear();
        self.pending_voice = false;
        self.loading = true;
        tracing::info!(model = %self.model, "message sent");

        Ok(PendingRequest {
            prompt,
            image,
            model: self.model.clone(),
        })
    }

    /// Record the outcome of the completion call and release the composer.
    pub fn finish_send(&mut self, model: &str, result: Result<String, ChatError>) {
        let record = match result {
            Ok(text) => MessageRecord::new(Sender::Assistant, text).with_model(model),
            Err(err) => {
                tracing::warn!("completion failed: {err}");
                MessageRecord::new(Sender::Assistant, err.user_message())
            }
        };
        self.push(record);
        self.loading = false;
    }

    /// Run a whole send against `backend`.
    ///
    /// `credential` is only checked when the backend needs one.
    pub async fn send(
        &mut self,
        backend: &dyn CompletionBackend,
        system_prompt: &str,
        credential: Option<&str>,
        readiness: Readiness,
    ) -> Result<(), SendRejected> {
        let required = if backend.requires_credential() {
            Some(credential.unwrap_or_default())
        } else {
            None
        };
        let pending = self.begin_send(required, readiness)?;
        let model = pending.model.clone();
        let request = pending.into_completion(system_prompt, credential);
        let result = backend.complete(&request).await;
        self.finish_send(&model, result);
        Ok(())
    }

    pub fn clear(&mut self) {
        tracing::info!(count = self.messages.len(), "conversation cleared");
        self.messages.clear();
    }

    /// Start or stop the audio capture.
    ///
    /// Stopping substitutes the placeholder transcript into the composer.
    pub fn toggle_recording(&mut self, capture: &mut dyn AudioCapture) -> Result<(), CaptureError> {
        if self.recording {
            let recording = capture.stop()?;
            self.recording = false;
            let transcript = placeholder_transcript(recording.duration);
            if self.input.trim().is_empty() {
                self.input = transcript;
            } else {
                self.input = format!("{} {}", self.input.trim_end(), transcript);
            }
            self.pending_voice = true;
            tracing::info!(seconds = recording.duration.whole_seconds(), "recording stopped");
        } else {
            capture.start()?;
            self.recording = true;
            tracing::info!("recording started");
        }
        Ok(())
    }

    fn push(&mut self, record: MessageRecord) {
        self.messages.push(record);
    }
}
