use super::ExportError;
use crate::types::{MediaKind, MessageRecord};
use printpdf::{Mm, PdfDocument};
use std::io::Cursor;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const LINE_HEIGHT_MM: f32 = 5.0;
const BLOCK_GAP_MM: f32 = 3.0;
const TITLE_SIZE: f32 = 16.0;
const HEADER_SIZE: f32 = 9.0;
const BODY_SIZE: f32 = 10.0;
/// DejaVu Sans at 10pt fits roughly this many characters across the text column.
const WRAP_COLUMNS: usize = 88;

// Builtin PDF fonts only cover Latin-1 in WinAnsi; replies come in any language.
const REGULAR_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BOLD_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Header,
    Body,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PdfLine {
    pub text: String,
    pub style: LineStyle,
    /// Distance from the bottom edge of the page.
    pub y_mm: f32,
}

/// Break `text` into lines of at most `width` characters, keeping explicit newlines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                lines.push(word.drain(..width).collect());
            }
            let word_len = word.len();
            let word: String = word.into_iter().collect();
            let needed = current.chars().count() + usize::from(!current.is_empty()) + word_len;
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn header_line(message: &MessageRecord) -> String {
    let mut header = format!("{} - {}", message.sender.label(), message.timestamp);
    if let Some(model) = &message.model {
        header.push_str(&format!(" - {model}"));
    }
    match &message.media {
        Some(MediaKind::Image { .. }) => header.push_str(" - [image attached]"),
        Some(MediaKind::Voice) => header.push_str(" - [voice]"),
        None => {}
    }
    header
}

/// Place the transcript onto pages; each inner vec is one page.
pub fn layout_transcript(messages: &[MessageRecord], title: &str) -> Vec<Vec<PdfLine>> {
    let top = PAGE_HEIGHT_MM - MARGIN_MM;
    let mut pages: Vec<Vec<PdfLine>> = vec![Vec::new()];
    let mut y = top;

    let place = |pages: &mut Vec<Vec<PdfLine>>, y: &mut f32, text: String, style| {
        if *y < MARGIN_MM {
            pages.push(Vec::new());
            *y = top;
        }
        if let Some(page) = pages.last_mut() {
            page.push(PdfLine {
                text,
                style,
                y_mm: *y,
            });
        }
        *y -= LINE_HEIGHT_MM;
    };

    place(&mut pages, &mut y, title.to_string(), LineStyle::Title);
    y -= BLOCK_GAP_MM;

    for message in messages {
        place(
            &mut pages,
            &mut y,
            header_line(message),
            LineStyle::Header,
        );
        for line in wrap_text(&message.text, WRAP_COLUMNS) {
            place(&mut pages, &mut y, line, LineStyle::Body);
        }
        y -= BLOCK_GAP_MM;
    }
    pages
}

/// Render the conversation as an A4 PDF transcript.
pub fn transcript_pdf(messages: &[MessageRecord], title: &str) -> Result<Vec<u8>, ExportError> {
    if messages.is_empty() {
        return Err(ExportError::EmptyConversation);
    }
    let pdf_err = |err: &dyn std::fmt::Display| ExportError::Pdf(err.to_string());

    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Transcript",
    );
    let regular = doc
        .add_external_font(Cursor::new(REGULAR_FONT))
        .map_err(|e| pdf_err(&e))?;
    let bold = doc
        .add_external_font(Cursor::new(BOLD_FONT))
        .map_err(|e| pdf_err(&e))?;

    let pages = layout_transcript(messages, title);
    let page_count = pages.len();
    for (index, lines) in pages.into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Transcript");
            doc.get_page(page).get_layer(layer)
        };
        for line in lines {
            let (font, size) = match line.style {
                LineStyle::Title => (&bold, TITLE_SIZE),
                LineStyle::Header => (&bold, HEADER_SIZE),
                LineStyle::Body => (&regular, BODY_SIZE),
            };
            layer.use_text(line.text, size, Mm(MARGIN_MM), Mm(line.y_mm), font);
        }
    }

    let bytes = doc.save_to_bytes().map_err(|e| pdf_err(&e))?;
    tracing::info!(pages = page_count, size = bytes.len(), "transcript rendered");
    Ok(bytes)
}
