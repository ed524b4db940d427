use crate::config::Provider;
use crate::session::ChatSession;
use crate::storage::{load_credential, mask_credential, save_credential};
use dioxus::events::Key;
use dioxus::prelude::*;

#[component]
pub fn SettingsPanel(
    session: Signal<ChatSession>,
    credential: Signal<Option<String>>,
    provider: Provider,
    models: Vec<String>,
    show_settings: Signal<bool>,
    notice: Signal<Option<String>>,
) -> Element {
    let mut session = session;
    let mut credential = credential;
    let mut show_settings = show_settings;
    let mut notice = notice;
    let mut draft = use_signal(String::new);

    let mut save_key = move || {
        let value = draft();
        match save_credential(&value) {
            Ok(()) => {
                let saved = load_credential().or_else(|| {
                    let trimmed = value.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                });
                let message = if saved.is_some() {
                    "API key saved."
                } else {
                    "API key removed."
                };
                credential.set(saved);
                draft.set(String::new());
                notice.set(Some(message.to_string()));
                show_settings.set(false);
            }
            Err(err) => {
                tracing::error!("failed to save credential: {err:#}");
                notice.set(Some(format!("Could not save the API key: {err}")));
            }
        }
    };

    let current_model = session.read().model().to_string();
    let key_status = match credential() {
        Some(key) => format!("Saved key: {}", mask_credential(&key)),
        None => "No API key saved yet.".to_string(),
    };

    rsx! {
        div { class: "settings-panel",
            if provider == Provider::Endpoint {
                div { class: "settings-section",
                    h3 { class: "section-title", "API key" }
                    p { class: "text-muted", "{key_status}" }
                    div { class: "hstack",
                        input {
                            r#type: "password", placeholder: "sk-...",
                            autocomplete: "off", value: "{draft}",
                            oninput: move |ev| draft.set(ev.value()),
                            onkeydown: move |ev| {
                                if ev.key() == Key::Enter {
                                    ev.prevent_default();
                                    save_key();
                                }
                            },
                        }
                        button {
                            class: "btn btn-primary", r#type: "button",
                            onclick: move |_| save_key(),
                            "Save"
                        }
                    }
                    p { class: "text-muted small",
                        "The key is stored on this device only and sent only to the completion endpoint. Saving an empty value removes it."
                    }
                }
            } else {
                div { class: "settings-section",
                    h3 { class: "section-title", "AI service" }
                    p { class: "text-muted", "Using the AI bridge built into the page; no API key needed." }
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "Model" }
                select {
                    value: "{current_model}",
                    onchange: move |ev| session.with_mut(|s| s.select_model(ev.value())),
                    for model in models.iter() {
                        option {
                            value: "{model}",
                            selected: *model == current_model,
                            "{model}"
                        }
                    }
                }
            }
        }
    }
}
