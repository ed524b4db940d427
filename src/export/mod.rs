//! Conversation exports: a PDF transcript and a PNG snapshot
//!
//! The PDF is laid out here; the PNG is rasterised by the webview from the
//! rendered chat list and only validated on this side.

pub mod pdf;
pub mod snapshot;

pub use pdf::transcript_pdf;
pub use snapshot::{PngSnapshot, SNAPSHOT_SCRIPT, decode_png_data_url};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

const FILE_STAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day]-[hour][minute][second]");

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export")]
    EmptyConversation,

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("snapshot is not a PNG data URL")]
    NotPngDataUrl,

    #[error("snapshot payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("snapshot image is unreadable: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Pdf,
    Png,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Pdf => "pdf",
            ExportKind::Png => "png",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportKind::Pdf => "application/pdf",
            ExportKind::Png => "image/png",
        }
    }
}

/// `parley-chat-YYYYMMDD-HHMMSS.<ext>`
pub fn export_file_name(kind: ExportKind, now: OffsetDateTime) -> String {
    let stamp = now
        .format(FILE_STAMP_FORMAT)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("parley-chat-{stamp}.{}", kind.extension())
}

/// Data URL a browser download link can point at.
pub fn download_data_url(kind: ExportKind, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", kind.mime(), STANDARD.encode(bytes))
}

/// Write an export into the platform download directory.
#[cfg(not(target_arch = "wasm32"))]
pub fn save_to_downloads(
    file_name: &str,
    bytes: &[u8],
) -> Result<std::path::PathBuf, ExportError> {
    let dir = dirs::download_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    save_into(&dir, file_name, bytes)
}

#[cfg(not(target_arch = "wasm32"))]
fn save_into(
    dir: &std::path::Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<std::path::PathBuf, ExportError> {
    let io_err = |path: &std::path::Path, source| ExportError::Io {
        path: path.display().to_string(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes).map_err(|e| io_err(&path, e))?;
    tracing::info!(path = %path.display(), size = bytes.len(), "export saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_file_names() {
        let now = datetime!(2024-05-06 07:08:09 UTC);
        assert_eq!(
            export_file_name(ExportKind::Pdf, now),
            "parley-chat-20240506-070809.pdf"
        );
        assert_eq!(
            export_file_name(ExportKind::Png, now),
            "parley-chat-20240506-070809.png"
        );
    }

    #[test]
    fn test_download_data_url() {
        assert_eq!(
            download_data_url(ExportKind::Pdf, b"%PDF"),
            "data:application/pdf;base64,JVBERg=="
        );
    }

    #[test]
    fn test_save_into_creates_directory() {
        let dir = std::env::temp_dir()
            .join(format!("parley-export-{}", uuid::Uuid::new_v4()))
            .join("nested");
        let path = save_into(&dir, "out.pdf", b"data").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
        std::fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }
}
