use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use uuid::Uuid;

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// What kind of media a message carries besides its text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaKind {
    Image { mime: String },
    Voice,
}

/// An image held in memory as a base64 data URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub file_name: String,
    pub mime: String,
    pub data_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub image: Option<ImageAttachment>,
    pub media: Option<MediaKind>,
    pub timestamp: String,
    pub model: Option<String>,
}

impl MessageRecord {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            image: None,
            media: None,
            timestamp: format_timestamp(OffsetDateTime::now_utc()),
            model: None,
        }
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.media = Some(MediaKind::Image {
            mime: image.mime.clone(),
        });
        self.image = Some(image);
        self
    }

    pub fn with_media(mut self, media: MediaKind) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn is_user(&self) -> bool {
        matches!(self.sender, Sender::User)
    }
}

pub fn format_timestamp(datetime: OffsetDateTime) -> String {
    let mut datetime = datetime;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).unwrap_or_default()
}
