//! AI module for Parley
//!
//! This module provides the completion seam the chat talks through. Two
//! backends are available, selected by [`crate::config::Provider`]:
//!
//! - `endpoint` - HTTP chat-completions API authenticated with a bearer key
//! - `bridge` - AI SDK injected into the page (`window.puter`), web views only
//!
//! # Usage
//!
//! ```rust,no_run
//! use parley::ai::{CompletionBackend, CompletionRequest, EndpointBackend};
//!
//! # async fn example() -> Result<(), parley::ai::ChatError> {
//! let backend = EndpointBackend::new("https://api.openai.com/v1/chat/completions");
//! let request = CompletionRequest {
//!     model: "gpt-4o-mini".into(),
//!     system_prompt: "Be brief.".into(),
//!     prompt: "Hello!".into(),
//!     image: None,
//!     credential: Some("sk-...".into()),
//! };
//! let reply = backend.complete(&request).await?;
//! # Ok(())
//! # }
//! ```
#[cfg(feature = "dioxus")]
mod bridge;
mod endpoint;

#[cfg(feature = "dioxus")]
pub use bridge::{BridgeBackend, wait_for_bridge};
pub use endpoint::{EndpointBackend, parse_completion_body, status_error};

use crate::types::ImageAttachment;
use async_trait::async_trait;
use reqwest::StatusCode;

// ============================================
// Error Types
// ============================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("authentication failed ({0})")]
    Unauthorized(String),

    #[error("rate limit exceeded ({0})")]
    RateLimited(String),

    #[error("completion service returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unreadable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Bridge(String),

    #[error("no API key configured")]
    MissingCredential,
}

impl ChatError {
    /// HTTP status behind the failure, when there is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ChatError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ChatError::RateLimited(_) => Some(StatusCode::TOO_MANY_REQUESTS),
            ChatError::Api { status, .. } => Some(*status),
            ChatError::Http(err) => err.status(),
            _ => None,
        }
    }

    /// Text shown to the user as the assistant's reply.
    pub fn user_message(&self) -> String {
        match self.status() {
            Some(StatusCode::UNAUTHORIZED) => {
                "Authentication failed: your API key was rejected. Check it in the settings panel."
                    .to_string()
            }
            Some(StatusCode::TOO_MANY_REQUESTS) => {
                "Rate limit reached: too many requests. Wait a moment and try again.".to_string()
            }
            _ => match self {
                ChatError::MissingCredential => {
                    "Add your API key in the settings panel before chatting.".to_string()
                }
                ChatError::Bridge(message) if !message.trim().is_empty() => {
                    format!("Error: {message}")
                }
                ChatError::Api { .. } | ChatError::Http(_) | ChatError::Decode(_) => {
                    format!("Error: {self}")
                }
                _ => "Error: something went wrong.".to_string(),
            },
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

/// Reply shown when the service answers without any text.
pub const EMPTY_REPLY: &str = "No response received.";

fn non_empty_reply(text: Option<String>) -> String {
    text.filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| EMPTY_REPLY.to_string())
}

// ============================================
// Backend seam
// ============================================

/// One prompt addressed to the completion service.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
    pub image: Option<ImageAttachment>,
    pub credential: Option<String>,
}

/// Whether a backend can take requests yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Pending,
}

// Futures are not `Send`: the browser fetch and the webview bridge live on the UI thread.
#[async_trait(?Send)]
pub trait CompletionBackend {
    /// Whether a user-supplied credential must be present before sending.
    fn requires_credential(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> ChatResult<String>;
}
