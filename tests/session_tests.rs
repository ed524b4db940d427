//! Integration tests for the chat session
//!
//! Sends run against scripted backends and a scripted microphone.

use async_trait::async_trait;
use parley::ai::{ChatResult, CompletionBackend, CompletionRequest, Readiness, status_error};
use parley::session::{ChatSession, NOT_READY_NOTICE, SendRejected};
use parley::types::{MediaKind, Sender};
use parley::voice::{AudioCapture, CaptureError, Recording};
use reqwest::StatusCode;
use std::cell::RefCell;
use std::collections::HashSet;
use time::Duration;

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

enum Script {
    Reply(&'static str),
    Status(StatusCode),
}

struct ScriptedBackend {
    script: Script,
    needs_key: bool,
    seen: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    fn replying(text: &'static str) -> Self {
        Self {
            script: Script::Reply(text),
            needs_key: true,
            seen: RefCell::new(Vec::new()),
        }
    }

    fn failing(status: StatusCode) -> Self {
        Self {
            script: Script::Status(status),
            needs_key: true,
            seen: RefCell::new(Vec::new()),
        }
    }

    fn keyless(mut self) -> Self {
        self.needs_key = false;
        self
    }
}

#[async_trait(?Send)]
impl CompletionBackend for ScriptedBackend {
    fn requires_credential(&self) -> bool {
        self.needs_key
    }

    async fn complete(&self, request: &CompletionRequest) -> ChatResult<String> {
        self.seen.borrow_mut().push(request.clone());
        match self.script {
            Script::Reply(text) => Ok(text.to_string()),
            Script::Status(status) => Err(status_error(status, "{}".to_string())),
        }
    }
}

#[derive(Default)]
struct ScriptedMic {
    running: bool,
    starts: usize,
    stops: usize,
}

impl AudioCapture for ScriptedMic {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.running {
            return Err(CaptureError::AlreadyRecording);
        }
        self.running = true;
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<Recording, CaptureError> {
        if !self.running {
            return Err(CaptureError::NotRecording);
        }
        self.running = false;
        self.stops += 1;
        Ok(Recording {
            duration: Duration::seconds(7),
            wav: None,
        })
    }
}

mod sending {
    use super::*;

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        init_tracing();
        let backend = ScriptedBackend::replying("unused");
        let mut session = ChatSession::new("gpt-4o-mini");
        session.set_input("   \n ");

        let outcome = session
            .send(&backend, SYSTEM_PROMPT, Some("sk-test"), Readiness::Ready)
            .await;

        assert_eq!(outcome, Err(SendRejected::EmptyInput));
        assert!(session.messages().is_empty());
        assert!(backend.seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_blocks_send() {
        init_tracing();
        let backend = ScriptedBackend::replying("unused");
        let mut session = ChatSession::new("gpt-4o-mini");
        session.set_input("hello");

        let outcome = session
            .send(&backend, SYSTEM_PROMPT, None, Readiness::Ready)
            .await;

        assert_eq!(outcome, Err(SendRejected::MissingCredential));
        assert!(session.messages().is_empty());
        assert_eq!(session.input(), "hello");
        assert!(backend.seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_success_appends_user_then_assistant() {
        init_tracing();
        let backend = ScriptedBackend::replying("Hi! How can I help?");
        let mut session = ChatSession::new("gpt-4o");
        session.set_input("  Hello  ");

        session
            .send(&backend, SYSTEM_PROMPT, Some("sk-test"), Readiness::Ready)
            .await
            .expect("send should go out");

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "Hello");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].text, "Hi! How can I help?");
        assert_eq!(messages[1].model.as_deref(), Some("gpt-4o"));
        assert!(!session.is_loading());
        assert_eq!(session.input(), "");

        let seen = backend.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].prompt, "Hello");
        assert_eq!(seen[0].system_prompt, SYSTEM_PROMPT);
        assert_eq!(seen[0].credential.as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    async fn test_unauthorized_reply_mentions_authentication() {
        init_tracing();
        let backend = ScriptedBackend::failing(StatusCode::UNAUTHORIZED);
        let mut session = ChatSession::new("gpt-4o-mini");
        session.set_input("hello");

        session
            .send(&backend, SYSTEM_PROMPT, Some("sk-bad"), Readiness::Ready)
            .await
            .expect("send should go out");

        let reply = &session.messages()[1];
        assert_eq!(reply.sender, Sender::Assistant);
        assert!(reply.text.contains("Authentication failed"));
        assert!(reply.model.is_none());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_rate_limited_reply_mentions_rate_limit() {
        init_tracing();
        let backend = ScriptedBackend::failing(StatusCode::TOO_MANY_REQUESTS);
        let mut session = ChatSession::new("gpt-4o-mini");
        session.set_input("hello");

        session
            .send(&backend, SYSTEM_PROMPT, Some("sk-test"), Readiness::Ready)
            .await
            .expect("send should go out");

        assert!(session.messages()[1].text.contains("Rate limit"));
    }

    #[tokio::test]
    async fn test_server_error_reply_is_generic_error() {
        init_tracing();
        let backend = ScriptedBackend::failing(StatusCode::INTERNAL_SERVER_ERROR);
        let mut session = ChatSession::new("gpt-4o-mini");
        session.set_input("hello");

        session
            .send(&backend, SYSTEM_PROMPT, Some("sk-test"), Readiness::Ready)
            .await
            .expect("send should go out");

        assert!(session.messages()[1].text.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_keyless_backend_waits_for_readiness() {
        init_tracing();
        let backend = ScriptedBackend::replying("ready now").keyless();
        let mut session = ChatSession::new("gpt-4o-mini");
        session.set_input("hello");

        let outcome = session
            .send(&backend, SYSTEM_PROMPT, None, Readiness::Pending)
            .await;
        assert_eq!(outcome, Err(SendRejected::NotReady));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text, NOT_READY_NOTICE);
        assert_eq!(session.input(), "hello");

        session
            .send(&backend, SYSTEM_PROMPT, None, Readiness::Ready)
            .await
            .expect("send should go out once ready");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[2].text, "ready now");
        assert!(backend.seen.borrow()[0].credential.is_none());
    }

    #[tokio::test]
    async fn test_message_ids_are_unique() {
        init_tracing();
        let backend = ScriptedBackend::replying("ok");
        let mut session = ChatSession::new("gpt-4o-mini");
        for i in 0..5 {
            session.set_input(format!("message {i}"));
            session
                .send(&backend, SYSTEM_PROMPT, Some("sk-test"), Readiness::Ready)
                .await
                .expect("send should go out");
        }

        let ids: HashSet<_> = session.messages().iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids.len(), 10);
    }

    #[tokio::test]
    async fn test_clear_empties_the_log() {
        init_tracing();
        let backend = ScriptedBackend::replying("ok");
        let mut session = ChatSession::new("gpt-4o-mini");
        session.set_input("hello");
        session
            .send(&backend, SYSTEM_PROMPT, Some("sk-test"), Readiness::Ready)
            .await
            .expect("send should go out");

        session.clear();
        assert!(session.messages().is_empty());
        assert_eq!(session.model(), "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_selected_model_is_used_for_next_send() {
        init_tracing();
        let backend = ScriptedBackend::replying("ok");
        let mut session = ChatSession::new("gpt-4o-mini");
        session.select_model("gpt-4o");
        session.set_input("hello");
        session
            .send(&backend, SYSTEM_PROMPT, Some("sk-test"), Readiness::Ready)
            .await
            .expect("send should go out");

        assert_eq!(backend.seen.borrow()[0].model, "gpt-4o");
        assert_eq!(session.messages()[1].model.as_deref(), Some("gpt-4o"));
    }
}

mod recording {
    use super::*;

    #[test]
    fn test_each_click_toggles_once() {
        let mut mic = ScriptedMic::default();
        let mut session = ChatSession::new("gpt-4o-mini");

        session.toggle_recording(&mut mic).expect("start");
        assert!(session.is_recording());
        assert_eq!(mic.starts, 1);

        session.toggle_recording(&mut mic).expect("stop");
        assert!(!session.is_recording());
        assert_eq!(mic.stops, 1);
        assert!(session.input().starts_with("[Voice message 0:07]"));
    }

    #[test]
    fn test_transcript_appends_to_typed_text() {
        let mut mic = ScriptedMic::default();
        let mut session = ChatSession::new("gpt-4o-mini");
        session.set_input("Note:");

        session.toggle_recording(&mut mic).expect("start");
        session.toggle_recording(&mut mic).expect("stop");

        assert!(session.input().starts_with("Note: [Voice message"));
    }

    #[tokio::test]
    async fn test_voice_message_is_tagged() {
        let backend = ScriptedBackend::replying("heard you");
        let mut mic = ScriptedMic::default();
        let mut session = ChatSession::new("gpt-4o-mini");

        session.toggle_recording(&mut mic).expect("start");
        session.toggle_recording(&mut mic).expect("stop");
        session
            .send(&backend, SYSTEM_PROMPT, Some("sk-test"), Readiness::Ready)
            .await
            .expect("send should go out");

        assert_eq!(session.messages()[0].media, Some(MediaKind::Voice));
        assert!(session.messages()[1].media.is_none());
    }

    #[test]
    fn test_failed_start_leaves_state_unchanged() {
        let mut mic = ScriptedMic {
            running: true,
            ..Default::default()
        };
        let mut session = ChatSession::new("gpt-4o-mini");

        let err = session.toggle_recording(&mut mic);
        assert!(matches!(err, Err(CaptureError::AlreadyRecording)));
        assert!(!session.is_recording());
    }
}
