use super::{ChatError, ChatResult, CompletionBackend, CompletionRequest, non_empty_reply};
use async_trait::async_trait;
use dioxus::prelude::*;
use serde::Deserialize;
use serde_json::{Value, json};

/// Polls every 300ms until the injected SDK exposes `ai.chat`.
const READY_SCRIPT: &str = r#"
const ready = () => window.puter && window.puter.ai && typeof window.puter.ai.chat === "function";
if (ready()) {
    dioxus.send(true);
} else {
    const timer = setInterval(() => {
        if (ready()) {
            clearInterval(timer);
            dioxus.send(true);
        }
    }, 300);
}
"#;

const CHAT_SCRIPT: &str = r#"
const request = await dioxus.recv();
try {
    const options = request.model ? { model: request.model } : {};
    let reply;
    if (request.image) {
        reply = await window.puter.ai.chat(request.prompt, request.image, false, options);
    } else {
        reply = await window.puter.ai.chat([
            { role: "system", content: request.system },
            { role: "user", content: request.prompt },
        ], false, options);
    }
    let text = "";
    if (typeof reply === "string") {
        text = reply;
    } else if (reply && reply.message) {
        const content = reply.message.content;
        text = Array.isArray(content)
            ? content.map((part) => part.text || "").join("")
            : (content || "");
    }
    dioxus.send({ ok: text });
} catch (err) {
    dioxus.send({ error: (err && (err.message || err.error?.message)) || String(err || "") });
}
"#;

#[derive(Deserialize)]
#[serde(untagged)]
enum BridgeReply {
    Ok { ok: String },
    Err { error: String },
}

/// Resolves once the page's AI SDK is loaded.
pub async fn wait_for_bridge() -> bool {
    let mut eval = document::eval(READY_SCRIPT);
    match eval.recv::<bool>().await {
        Ok(ready) => ready,
        Err(err) => {
            tracing::error!("bridge readiness check failed: {err}");
            false
        }
    }
}

/// Completion through the AI SDK injected into the page as `window.puter`
#[derive(Default)]
pub struct BridgeBackend;

#[async_trait(?Send)]
impl CompletionBackend for BridgeBackend {
    fn requires_credential(&self) -> bool {
        false
    }

    async fn complete(&self, request: &CompletionRequest) -> ChatResult<String> {
        let mut eval = document::eval(CHAT_SCRIPT);
        eval.send(json!({
            "model": request.model,
            "system": request.system_prompt,
            "prompt": request.prompt,
            "image": request.image.as_ref().map(|image| image.data_url.clone()),
        }))
        .map_err(|err| ChatError::Bridge(err.to_string()))?;

        let reply: Value = eval
            .recv()
            .await
            .map_err(|err| ChatError::Bridge(err.to_string()))?;
        match serde_json::from_value::<BridgeReply>(reply)? {
            BridgeReply::Ok { ok } => Ok(non_empty_reply(Some(ok))),
            BridgeReply::Err { error } => Err(ChatError::Bridge(error)),
        }
    }
}
