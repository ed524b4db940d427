use crate::types::ImageAttachment;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;

/// Largest image accepted as an attachment.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Formats the chat-completions APIs take as `image_url` content.
const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("{0} is empty")]
    Empty(String),

    #[error("{name} is {size} bytes, over the {} byte limit", MAX_IMAGE_BYTES)]
    TooLarge { name: String, size: usize },

    #[error("{0} is not a supported image")]
    NotAnImage(String),

    #[error("failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl ImageAttachment {
    /// Build an attachment from raw file bytes, sniffing the image format.
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> Result<Self, AttachmentError> {
        if bytes.is_empty() {
            return Err(AttachmentError::Empty(file_name.to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AttachmentError::TooLarge {
                name: file_name.to_string(),
                size: bytes.len(),
            });
        }
        let format = image::guess_format(bytes)
            .ok()
            .filter(|format| ACCEPTED_FORMATS.contains(format))
            .ok_or_else(|| AttachmentError::NotAnImage(file_name.to_string()))?;
        let mime = format.to_mime_type().to_string();
        let data_url = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
        Ok(Self {
            file_name: file_name.to_string(),
            mime,
            data_url,
        })
    }

    /// Approximate payload size, for display.
    pub fn size_label(&self) -> String {
        let encoded = self
            .data_url
            .split_once(',')
            .map(|(_, data)| data.len())
            .unwrap_or(0);
        let bytes = encoded / 4 * 3;
        if bytes >= 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else {
            format!("{} KB", bytes.div_ceil(1024))
        }
    }
}

/// Read an image file from disk into memory.
#[cfg(not(target_arch = "wasm32"))]
pub fn read_image(path: &std::path::Path) -> Result<ImageAttachment, AttachmentError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string();
    let bytes = std::fs::read(path).map_err(|source| AttachmentError::Io {
        name: name.clone(),
        source,
    })?;
    ImageAttachment::from_bytes(&name, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_png_bytes_become_data_url() {
        let attachment = ImageAttachment::from_bytes("shot.png", PNG_MAGIC).unwrap();
        assert_eq!(attachment.mime, "image/png");
        assert!(attachment.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(attachment.file_name, "shot.png");
    }

    #[test]
    fn test_jpeg_is_sniffed_not_named() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10];
        let attachment = ImageAttachment::from_bytes("photo.bin", &jpeg).unwrap();
        assert_eq!(attachment.mime, "image/jpeg");
    }

    #[test]
    fn test_gif_and_webp_are_accepted() {
        let gif = ImageAttachment::from_bytes("anim.gif", b"GIF89a\x01\x00\x01\x00").unwrap();
        assert_eq!(gif.mime, "image/gif");
        let webp = ImageAttachment::from_bytes("pic.webp", b"RIFF\x24\x00\x00\x00WEBPVP8 ").unwrap();
        assert_eq!(webp.mime, "image/webp");
    }

    #[test]
    fn test_rejects_formats_the_api_cannot_read() {
        for (name, bytes) in [
            ("scan.tiff", &b"II*\x00\x08\x00\x00\x00"[..]),
            ("old.bmp", &b"BM\x36\x00\x00\x00\x00\x00"[..]),
            ("favicon.ico", &b"\x00\x00\x01\x00\x01\x00"[..]),
        ] {
            assert!(
                matches!(
                    ImageAttachment::from_bytes(name, bytes),
                    Err(AttachmentError::NotAnImage(_))
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn test_rejects_text_and_empty_files() {
        assert!(matches!(
            ImageAttachment::from_bytes("notes.txt", b"hello world"),
            Err(AttachmentError::NotAnImage(_))
        ));
        assert!(matches!(
            ImageAttachment::from_bytes("empty.png", &[]),
            Err(AttachmentError::Empty(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_files() {
        let mut big = PNG_MAGIC.to_vec();
        big.resize(MAX_IMAGE_BYTES + 1, 0);
        assert!(matches!(
            ImageAttachment::from_bytes("huge.png", &big),
            Err(AttachmentError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_image(std::path::Path::new("/definitely/not/here.png"));
        assert!(matches!(result, Err(AttachmentError::Io { .. })));
    }
}
