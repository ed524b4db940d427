use crate::ai::{CompletionBackend, Readiness};
use crate::session::{ChatSession, SendRejected};
use crate::types::{ImageAttachment, MediaKind, MessageRecord, Sender};
use crate::views::shared::{copy_to_clipboard, markdown_to_html};
use crate::voice::AudioCapture;
use dioxus::events::Key;
use dioxus::prelude::*;
use std::path::Path;
use std::rc::Rc;

const SCROLL_TO_END: &str = r#"
const end = document.getElementById("chat-end");
if (end) end.scrollIntoView({ behavior: "smooth" });
"#;

fn display_name(raw: &str) -> String {
    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(raw)
        .to_string()
}

#[allow(clippy::too_many_arguments)]
#[component]
pub fn ChatView(
    session: Signal<ChatSession>,
    credential: Signal<Option<String>>,
    readiness: Signal<Readiness>,
    backend: Signal<Rc<dyn CompletionBackend>>,
    capture: Signal<Box<dyn AudioCapture>>,
    system_prompt: String,
    show_settings: Signal<bool>,
    notice: Signal<Option<String>>,
) -> Element {
    let mut session = session;
    let mut capture = capture;
    let mut show_settings = show_settings;
    let mut notice = notice;
    let system_prompt = use_signal(|| system_prompt);

    use_effect(move || {
        let _count = session.read().messages().len();
        let _loading = session.read().is_loading();
        let _ = document::eval(SCROLL_TO_END);
    });

    let mut send_message = move || {
        let backend = backend();
        let key = credential();
        let required = if backend.requires_credential() {
            Some(key.clone().unwrap_or_default())
        } else {
            None
        };
        let outcome = session.with_mut(|s| s.begin_send(required.as_deref(), readiness()));
        match outcome {
            Ok(pending) => {
                let model = pending.model.clone();
                let request = pending.into_completion(&system_prompt.read(), key.as_deref());
                spawn(async move {
                    let reply = backend.complete(&request).await;
                    session.with_mut(|s| s.finish_send(&model, reply));
                });
            }
            Err(SendRejected::MissingCredential) => {
                notice.set(Some(
                    "Add your API key in the settings panel before chatting.".to_string(),
                ));
                show_settings.set(true);
            }
            Err(reason) => tracing::debug!("send skipped: {reason}"),
        }
    };

    let mut toggle_recording = move || {
        let result = capture.with_mut(|device| {
            session.with_mut(|s| s.toggle_recording(device.as_mut()))
        });
        if let Err(err) = result {
            tracing::warn!("recording toggle failed: {err}");
            notice.set(Some(format!("Microphone: {err}")));
        }
    };

    let on_image_selected = move |evt: FormEvent| async move {
        let Some(engine) = evt.files() else {
            return;
        };
        for name in engine.files() {
            let label = display_name(&name);
            match engine.read_file(&name).await {
                Some(bytes) => match ImageAttachment::from_bytes(&label, &bytes) {
                    Ok(image) => session.with_mut(|s| s.attach_image(image)),
                    Err(err) => notice.set(Some(err.to_string())),
                },
                None => notice.set(Some(format!("Could not read {label}"))),
            }
        }
    };

    let snapshot = session.read().clone();
    let ready = readiness() == Readiness::Ready;
    let loading = snapshot.is_loading();
    let recording = snapshot.is_recording();
    let placeholder = if !ready {
        "Waiting for the AI to get ready..."
    } else if recording {
        "Recording... click the mic again to stop"
    } else {
        "Type your message..."
    };
    let (mic_class, mic_title) = if recording {
        ("btn btn-ghost recording", "Stop recording")
    } else {
        ("btn btn-ghost", "Record a voice message")
    };
    let input_value = snapshot.input().to_string();
    let can_send = ready && snapshot.can_send();
    let pending_image = snapshot
        .pending_image()
        .map(|image| (image.data_url.clone(), image.file_name.clone(), image.size_label()));

    rsx! {
        div { class: "chat-card",
            div { id: "chat-list", class: "chat-list",
                if snapshot.messages().is_empty() {
                    div { class: "empty-state", "Start chatting by typing a message below." }
                }
                for msg in snapshot.messages().iter() {
                    MessageBubble { key: "{msg.id}", message: msg.clone() }
                }
                if loading {
                    div { class: "message-row assistant",
                        div { class: "bubble assistant pending",
                            span { class: "spinner" }
                            "Thinking..."
                        }
                    }
                }
                div { id: "chat-end" }
            }

            if let Some((data_url, file_name, size)) = pending_image {
                div { class: "attachment-preview",
                    img { src: "{data_url}", alt: "{file_name}" }
                    span { class: "attachment-name", "{file_name} ({size})" }
                    button {
                        class: "btn btn-ghost", r#type: "button",
                        onclick: move |_| session.with_mut(|s| s.detach_image()),
                        "Remove"
                    }
                }
            }

            form { class: "composer", onsubmit: move |ev| ev.prevent_default(),
                input {
                    r#type: "file", id: "image-input", class: "visually-hidden",
                    accept: "image/*", disabled: loading,
                    onchange: on_image_selected,
                }
                label {
                    class: "btn btn-ghost", r#for: "image-input", title: "Attach an image",
                    "Image"
                }
                button {
                    class: mic_class, r#type: "button", disabled: loading, title: mic_title,
                    onclick: move |_| toggle_recording(),
                    if recording { "Stop" } else { "Mic" }
                }
                input {
                    r#type: "text", class: "composer-input", placeholder: placeholder,
                    value: "{input_value}",
                    disabled: !ready || loading,
                    oninput: move |ev| session.with_mut(|s| s.set_input(ev.value())),
                    onkeydown: move |ev| {
                        if ev.key() == Key::Enter && !ev.modifiers().shift() {
                            ev.prevent_default();
                            send_message();
                        }
                    },
                }
                button {
                    class: "btn btn-primary", r#type: "button",
                    disabled: !can_send,
                    onclick: move |_| send_message(),
                    if loading {
                        span { class: "spinner" }
                        "Sending"
                    } else {
                        "Send"
                    }
                }
            }
        }
    }
}

#[component]
fn MessageBubble(message: MessageRecord) -> Element {
    let side = message.sender.css_class();
    let voice = matches!(message.media, Some(MediaKind::Voice));
    let copy_payload = message.text.clone();
    let content_html = markdown_to_html(&message.text);
    let model = message.model.clone().filter(|_| !message.is_user());

    rsx! {
        div { class: "message-row {side}",
            div { class: "bubble {side}",
                if let Some(image) = message.image.as_ref() {
                    img { class: "bubble-image", src: "{image.data_url}", alt: "{image.file_name}" }
                }
                if voice {
                    span { class: "tag-pill", "Voice" }
                }
                if message.sender == Sender::Assistant {
                    div { class: "md", dangerous_inner_html: "{content_html}" }
                } else {
                    div { class: "plain", "{message.text}" }
                }
            }
            div { class: "message-meta {side}",
                span { class: "message-timestamp", "{message.timestamp}" }
                if let Some(model) = model {
                    span { class: "message-model", "{model}" }
                }
                if !message.is_user() {
                    button {
                        class: "action-btn", title: "Copy reply",
                        onclick: move |_| copy_to_clipboard(copy_payload.clone()),
                        "Copy"
                    }
                }
            }
        }
    }
}
