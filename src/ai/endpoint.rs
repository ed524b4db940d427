use super::{ChatError, ChatResult, CompletionBackend, CompletionRequest, non_empty_reply};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const MAX_TOKENS: u32 = 1024;
const TEMPERATURE: f32 = 0.7;

/// Chat-completions endpoint authenticated with a bearer credential
pub struct EndpointBackend {
    client: Client,
    endpoint: String,
}

impl EndpointBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: WireContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

fn build_body(request: &CompletionRequest) -> CompletionBody<'_> {
    let user_content = match &request.image {
        Some(image) => WireContent::Parts(vec![
            ContentPart::Text {
                text: &request.prompt,
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: &image.data_url,
                },
            },
        ]),
        None => WireContent::Text(&request.prompt),
    };
    CompletionBody {
        model: &request.model,
        messages: vec![
            WireMessage {
                role: "system",
                content: WireContent::Text(&request.system_prompt),
            },
            WireMessage {
                role: "user",
                content: user_content,
            },
        ],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

// Response shapes
#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct OpenAIShape {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct ContentOnly {
    content: String,
}

/// Extract the generated text from a successful response body.
///
/// Missing or blank content becomes [`EMPTY_REPLY`](super::EMPTY_REPLY).
pub fn parse_completion_body(body: &str) -> ChatResult<String> {
    // Try OpenAI-shaped response first
    if let Ok(parsed) = serde_json::from_str::<OpenAIShape>(body) {
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);
        return Ok(non_empty_reply(content));
    }

    // Then a bare { content }
    let parsed: ContentOnly = serde_json::from_str(body)?;
    Ok(non_empty_reply(Some(parsed.content)))
}

/// Map a non-success status to the matching error.
pub fn status_error(status: StatusCode, body: String) -> ChatError {
    match status {
        StatusCode::UNAUTHORIZED => ChatError::Unauthorized(body),
        StatusCode::TOO_MANY_REQUESTS => ChatError::RateLimited(body),
        _ => ChatError::Api { status, body },
    }
}

#[async_trait(?Send)]
impl CompletionBackend for EndpointBackend {
    async fn complete(&self, request: &CompletionRequest) -> ChatResult<String> {
        let credential = request
            .credential
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ChatError::MissingCredential)?;

        tracing::debug!(model = %request.model, endpoint = %self.endpoint, "sending completion");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(&build_body(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(%status, "completion request failed");
            return Err(status_error(status, body));
        }
        parse_completion_body(&body)
    }
}
