use crate::ai::{BridgeBackend, CompletionBackend, EndpointBackend, Readiness, wait_for_bridge};
use crate::config::{AppConfig, Provider};
use crate::export::{ExportKind, SNAPSHOT_SCRIPT, decode_png_data_url, transcript_pdf};
use crate::session::ChatSession;
use crate::storage::load_credential;
use crate::views::shared::deliver_download;
use crate::views::{ChatView, SettingsPanel};
use crate::voice::default_capture;
use dioxus::prelude::*;
use serde::Deserialize;
use std::rc::Rc;

const PARLEY_CSS: Asset = asset!("/assets/parley.css");
const BRIDGE_SDK: &str = "https://js.puter.com/v2/";
const TRANSCRIPT_TITLE: &str = "Parley conversation";

fn backend_for(config: &AppConfig) -> Rc<dyn CompletionBackend> {
    match config.provider {
        Provider::Endpoint => Rc::new(EndpointBackend::new(config.endpoint.clone())),
        Provider::Bridge => Rc::new(BridgeBackend),
    }
}

fn initial_readiness(provider: Provider) -> Readiness {
    match provider {
        Provider::Endpoint => Readiness::Ready,
        Provider::Bridge => Readiness::Pending,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotReply {
    Ok { ok: String },
    Err { error: String },
}

#[component]
pub fn App() -> Element {
    let config = use_hook(AppConfig::from_env);
    let session = use_signal(|| ChatSession::new(config.default_model.clone()));
    let credential = use_signal(|| load_credential().or_else(|| config.fallback_api_key.clone()));
    let readiness = use_signal(|| initial_readiness(config.provider));
    let backend = use_signal(|| backend_for(&config));
    let capture = use_signal(default_capture);
    let show_settings =
        use_signal(|| config.provider == Provider::Endpoint && credential.peek().is_none());
    let notice = use_signal(|| Option::<String>::None);

    use_bridge_readiness(readiness);

    rsx! {
        document::Link { rel: "stylesheet", href: PARLEY_CSS }
        if config.provider == Provider::Bridge {
            document::Script { src: BRIDGE_SDK }
        }
        div { class: "app-shell",
            AppHeader { readiness, session, show_settings, notice }
            if let Some(message) = notice() {
                NoticeBar { message, notice }
            }
            if show_settings() {
                SettingsPanel {
                    session,
                    credential,
                    provider: config.provider,
                    models: config.models.clone(),
                    show_settings,
                    notice,
                }
            }
            ChatView {
                session,
                credential,
                readiness,
                backend,
                capture,
                system_prompt: config.system_prompt.clone(),
                show_settings,
                notice,
            }
        }
    }
}

fn use_bridge_readiness(readiness: Signal<Readiness>) {
    let mut readiness = readiness;
    use_future(move || async move {
        if *readiness.peek() == Readiness::Pending && wait_for_bridge().await {
            tracing::info!("AI bridge ready");
            readiness.set(Readiness::Ready);
        }
    });
}

#[component]
fn AppHeader(
    readiness: Signal<Readiness>,
    session: Signal<ChatSession>,
    show_settings: Signal<bool>,
    notice: Signal<Option<String>>,
) -> Element {
    let mut session = session;
    let mut show_settings = show_settings;
    let mut notice = notice;
    let ready = readiness() == Readiness::Ready;
    let has_messages = !session.read().messages().is_empty();
    let (badge_class, badge_label) = if ready {
        ("status-badge ready", "AI ready")
    } else {
        ("status-badge waiting", "Waiting for AI...")
    };

    let export_pdf = move |_| async move {
        let messages = session.read().messages().to_vec();
        let status = match transcript_pdf(&messages, TRANSCRIPT_TITLE) {
            Ok(bytes) => deliver_download(ExportKind::Pdf, bytes).await,
            Err(err) => Err(err.to_string()),
        };
        notice.set(Some(status.unwrap_or_else(|err| format!("PDF export failed: {err}"))));
    };

    let export_png = move |_| async move {
        let status = match capture_snapshot().await {
            Ok(bytes) => deliver_download(ExportKind::Png, bytes).await,
            Err(err) => Err(err),
        };
        notice.set(Some(status.unwrap_or_else(|err| format!("Image export failed: {err}"))));
    };

    rsx! {
        div { class: "header",
            h1 { class: "title", "Parley" }
            span { class: badge_class, "{badge_label}" }
            div { class: "toolbar",
                button {
                    class: "btn btn-ghost", r#type: "button",
                    onclick: move |_| show_settings.set(!show_settings()),
                    "Settings"
                }
                button {
                    class: "btn btn-ghost", r#type: "button", disabled: !has_messages,
                    onclick: export_pdf,
                    "PDF"
                }
                button {
                    class: "btn btn-ghost", r#type: "button", disabled: !has_messages,
                    onclick: export_png,
                    "PNG"
                }
                button {
                    class: "btn btn-ghost", r#type: "button", disabled: !has_messages,
                    onclick: move |_| session.with_mut(|s| s.clear()),
                    "Clear"
                }
            }
        }
    }
}

async fn capture_snapshot() -> Result<Vec<u8>, String> {
    let mut eval = document::eval(SNAPSHOT_SCRIPT);
    let reply = eval
        .recv::<serde_json::Value>()
        .await
        .map_err(|err| err.to_string())?;
    match serde_json::from_value::<SnapshotReply>(reply).map_err(|err| err.to_string())? {
        SnapshotReply::Ok { ok } => decode_png_data_url(&ok)
            .map(|snapshot| {
                tracing::info!(width = snapshot.width, height = snapshot.height, "snapshot captured");
                snapshot.bytes
            })
            .map_err(|err| err.to_string()),
        SnapshotReply::Err { error } => Err(error),
    }
}

#[component]
fn NoticeBar(message: String, notice: Signal<Option<String>>) -> Element {
    let mut notice = notice;
    rsx! {
        div { class: "notice",
            span { "{message}" }
            button {
                class: "action-btn", r#type: "button",
                onclick: move |_| notice.set(None),
                "Dismiss"
            }
        }
    }
}
