//! PDF text extraction for the upload preview.
//!
//! This module is intentionally small: it decodes an uploaded PDF, pulls the
//! text off the first page only, and returns a single display string. The
//! preview never blocks a submission — the backend receives the original file
//! bytes, not this text — so every failure here degrades to a placeholder
//! string instead of an error.

use lopdf::Document;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

/// Shown when the bytes cannot be decoded as a PDF.
pub const DECODE_FAILED_PLACEHOLDER: &str = "Error loading PDF";
/// Shown when the first page decodes but carries no text.
pub const NO_TEXT_PLACEHOLDER: &str = "No text extracted";

/// Extract the first page's text, joined with single spaces.
pub fn extract_preview(bytes: &[u8]) -> String {
    match first_page_text(bytes) {
        Ok(text) if text.is_empty() => {
            debug!("PDF decoded but first page has no text");
            NO_TEXT_PLACEHOLDER.to_string()
        }
        Ok(text) => text,
        Err(err) => {
            warn!("Error loading PDF: {err:#}");
            DECODE_FAILED_PLACEHOLDER.to_string()
        }
    }
}

fn first_page_text(bytes: &[u8]) -> anyhow::Result<String> {
    let doc = Document::load_mem(bytes)?;
    if doc.get_pages().is_empty() {
        return Ok(String::new());
    }
    let raw = doc.extract_text(&[1])?;
    let text = collapse_whitespace(&raw.nfc().collect::<String>());
    debug!(chars = text.len(), "Extracted first-page text");
    Ok(text)
}

/// Collapse any whitespace run (including newlines between text fragments)
/// into a single space.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    fn one_page_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");
        bytes
    }

    #[test]
    fn garbage_bytes_yield_decode_placeholder() {
        assert_eq!(extract_preview(b"definitely not a pdf"), DECODE_FAILED_PLACEHOLDER);
        assert_eq!(extract_preview(&[]), DECODE_FAILED_PLACEHOLDER);
    }

    #[test]
    fn first_page_text_is_extracted() {
        let bytes = one_page_pdf("Hello narration world");
        let preview = extract_preview(&bytes);
        assert!(
            preview.contains("Hello narration world"),
            "unexpected preview: {preview:?}"
        );
    }

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        assert_eq!(collapse_whitespace("a\n b\t\tc  d"), "a b c d");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
