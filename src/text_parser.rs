use lazy_static::lazy_static;
use regex::Regex;

use crate::document::{Document, DocumentSource, LinkMismatch};
use crate::html;
use crate::url_utils;

lazy_static! {
    static ref FROM_LINE_REGEX: Regex = Regex::new(r"(?im)^From:\s*(.+)$").unwrap();
    static ref URL_LIKE_REGEX: Regex = Regex::new(r"^https?://").unwrap();
}

/// Normalizer for raw pasted text. Users paste anything from plain prose
/// to whole HTML fragments, so anchor tags are scanned here too.
pub struct TextParser;

impl TextParser {
    pub fn parse(text: &str) -> Document {
        let mut doc = Document::empty(DocumentSource::PlainText);
        doc.body_text = text.to_string();
        doc.urls = dedup(url_utils::extract_urls(text));
        doc.link_mismatches = find_link_mismatches(text);
        doc.sender = detect_sender(text);
        doc
    }
}

/// Anchors qualify as a mismatch when the visible text itself looks like
/// a URL and differs from the href, and the href is not a mailto: link.
pub fn find_link_mismatches(text: &str) -> Vec<LinkMismatch> {
    if !text.to_lowercase().contains("<a ") {
        return Vec::new();
    }
    html::extract_anchors(text)
        .into_iter()
        .filter(|a| {
            URL_LIKE_REGEX.is_match(&a.visible_text)
                && a.visible_text != a.href
                && !a.href.starts_with("mailto:")
        })
        .map(|a| LinkMismatch {
            href: a.href,
            visible_text: a.visible_text,
        })
        .collect()
}

fn detect_sender(text: &str) -> Option<String> {
    FROM_LINE_REGEX
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    crate::document::push_unique_urls(&mut out, urls);
    out
}
