use crate::export::{ExportKind, export_file_name};
use comrak::{ComrakOptions, markdown_to_html as render_markdown};
use once_cell::sync::Lazy;
use time::OffsetDateTime;

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    options
});

/// Render assistant markdown; raw HTML in replies is dropped from the output.
pub fn markdown_to_html(md: &str) -> String {
    render_markdown(md, &MARKDOWN_OPTIONS)
}

pub fn copy_to_clipboard(text: String) {
    #[cfg(any(feature = "desktop", feature = "mobile"))]
    {
        match arboard::Clipboard::new() {
            Ok(mut cb) => {
                if let Err(err) = cb.set_text(text) {
                    tracing::warn!("clipboard write failed: {err}");
                }
            }
            Err(err) => tracing::warn!("clipboard unavailable: {err}"),
        }
    }
    #[cfg(not(any(feature = "desktop", feature = "mobile")))]
    {
        let _ = dioxus::prelude::document::eval(&format!(
            "navigator.clipboard && navigator.clipboard.writeText({});",
            serde_json::Value::String(text)
        ));
    }
}

#[cfg(target_arch = "wasm32")]
const DOWNLOAD_SCRIPT: &str = r#"
const file = await dioxus.recv();
const link = document.createElement("a");
link.href = file.url;
link.download = file.name;
document.body.appendChild(link);
link.click();
link.remove();
dioxus.send(true);
"#;

/// Hand an export to the user: a browser download on the web, a file in
/// the download directory elsewhere. Returns a status line for the UI.
pub async fn deliver_download(kind: ExportKind, bytes: Vec<u8>) -> Result<String, String> {
    let file_name = export_file_name(kind, OffsetDateTime::now_utc());

    #[cfg(target_arch = "wasm32")]
    {
        use dioxus::prelude::document;

        let url = crate::export::download_data_url(kind, &bytes);
        let mut eval = document::eval(DOWNLOAD_SCRIPT);
        eval.send(serde_json::json!({ "name": file_name, "url": url }))
            .map_err(|err| format!("Download failed: {err}"))?;
        eval.recv::<bool>()
            .await
            .map_err(|err| format!("Download failed: {err}"))?;
        Ok(format!("Downloaded {file_name}"))
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        crate::export::save_to_downloads(&file_name, &bytes)
            .map(|path| format!("Saved {}", path.display()))
            .map_err(|err| err.to_string())
    }
}
