use super::ExportError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Rasterises `#chat-list` with html-to-image and sends back a PNG data URL,
/// or `{ error }` when the library cannot be loaded.
pub const SNAPSHOT_SCRIPT: &str = r##"
const load = () => new Promise((resolve, reject) => {
    if (window.htmlToImage) { resolve(window.htmlToImage); return; }
    const script = document.createElement("script");
    script.src = "https://cdn.jsdelivr.net/npm/html-to-image@1.11.11/dist/html-to-image.js";
    script.onload = () => resolve(window.htmlToImage);
    script.onerror = () => reject(new Error("could not load html-to-image"));
    document.head.appendChild(script);
});
try {
    const node = document.getElementById("chat-list");
    if (!node) throw new Error("chat list is not rendered");
    const lib = await load();
    const background = getComputedStyle(document.body).backgroundColor || "#0f172a";
    const url = await lib.toPng(node, { pixelRatio: 2, backgroundColor: background });
    dioxus.send({ ok: url });
} catch (err) {
    dioxus.send({ error: String((err && err.message) || err) });
}
"##;

#[derive(Clone, Debug, PartialEq)]
pub struct PngSnapshot {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode the rasteriser's data URL and check it holds a readable PNG.
pub fn decode_png_data_url(url: &str) -> Result<PngSnapshot, ExportError> {
    let payload = url
        .trim()
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or(ExportError::NotPngDataUrl)?;
    let bytes = STANDARD.decode(payload)?;
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)?;
    Ok(PngSnapshot {
        width: decoded.width(),
        height: decoded.height(),
        bytes,
    })
}
