use std::collections::HashMap;

/// Where a document came from. Header-protocol checks only apply to
/// structured messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    PlainText,
    Eml,
}

/// An anchor whose visible text looks like a URL but points somewhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMismatch {
    pub href: String,
    pub visible_text: String,
}

/// Normalized representation of one piece of correspondence. Built once
/// per request by a parser and never mutated afterwards; every analyzer
/// reads from it.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: DocumentSource,
    /// Best-effort plain-text rendering of the content. If the message
    /// only carried HTML this is the tag-stripped text.
    pub body_text: String,
    /// Raw HTML part, structured messages only.
    pub body_html: Option<String>,
    /// Extracted absolute URLs, deduplicated.
    pub urls: Vec<String>,
    pub link_mismatches: Vec<LinkMismatch>,
    /// Lower-cased header name -> value, restricted to the retained
    /// header allow-list. First occurrence wins.
    pub headers: HashMap<String, String>,
    /// Every Received header in message order (the map only keeps the first).
    pub received_all: Vec<String>,
    /// Best-effort sender address, if one was found.
    pub sender: Option<String>,
}

/// Headers worth keeping for analysis; everything else is dropped at
/// parse time.
pub const RETAINED_HEADERS: &[&str] = &[
    "from",
    "to",
    "subject",
    "date",
    "reply-to",
    "return-path",
    "received",
    "received-spf",
    "authentication-results",
    "dkim-signature",
    "message-id",
];

impl Document {
    pub fn empty(source: DocumentSource) -> Self {
        Document {
            source,
            body_text: String::new(),
            body_html: None,
            urls: Vec::new(),
            link_mismatches: Vec::new(),
            headers: HashMap::new(),
            received_all: Vec::new(),
            sender: None,
        }
    }
}

/// Append URLs, keeping the first occurrence of each.
pub fn push_unique_urls(urls: &mut Vec<String>, extra: impl IntoIterator<Item = String>) {
    for url in extra {
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
}
