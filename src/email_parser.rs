use std::fmt;

use base64::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;

use crate::document::{Document, DocumentSource, RETAINED_HEADERS};
use crate::html;
use crate::text_parser;
use crate::url_utils;

/// Raised when a byte stream cannot be normalized into a message at all.
/// Missing parts degrade gracefully; this is only for input that carries
/// no recognizable header block.
#[derive(Debug)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message parse error: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

lazy_static! {
    static ref HEADER_LINE_REGEX: Regex = Regex::new(r"^([!-9;-~]+):\s*(.*)$").unwrap();
    static ref BOUNDARY_REGEX: Regex =
        Regex::new(r#"(?i)boundary\s*=\s*(?:"([^"]+)"|([^\s;]+))"#).unwrap();
    static ref ENCODED_WORD_REGEX: Regex =
        Regex::new(r"=\?([^?]+)\?([BbQq])\?([^?]*)\?=").unwrap();
}

/// Normalizer for raw RFC-822-style message bytes.
pub struct EmailParser;

impl EmailParser {
    pub fn parse(raw: &[u8]) -> Result<Document, ParseError> {
        let text = String::from_utf8_lossy(raw).into_owned();
        let entity = Entity::parse(&text);
        if entity.headers.is_empty() {
            return Err(ParseError("no message headers found".to_string()));
        }

        let mut doc = Document::empty(DocumentSource::Eml);
        for (name, value) in &entity.headers {
            if RETAINED_HEADERS.contains(&name.as_str()) {
                doc.headers
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
            if name == "received" {
                doc.received_all.push(value.clone());
            }
        }

        let (body_text, body_html) = extract_bodies(&entity);

        if let Some(ref plain) = body_text {
            crate::document::push_unique_urls(&mut doc.urls, url_utils::extract_urls(plain));
            doc.body_text = plain.clone();
        }
        if let Some(ref html_part) = body_html {
            let anchors = html::extract_anchors(html_part);
            crate::document::push_unique_urls(
                &mut doc.urls,
                anchors
                    .iter()
                    .filter(|a| a.href.starts_with("http://") || a.href.starts_with("https://"))
                    .map(|a| a.href.clone()),
            );
            doc.link_mismatches = text_parser::find_link_mismatches(html_part);
            if doc.body_text.is_empty() {
                doc.body_text = html::strip_tags(html_part);
            }
        }
        doc.body_html = body_html;
        doc.sender = doc.headers.get("from").cloned();

        Ok(doc)
    }
}

/// One MIME entity: unfolded lower-cased headers plus the raw body text.
struct Entity {
    headers: Vec<(String, String)>,
    body: String,
}

impl Entity {
    fn parse(raw: &str) -> Self {
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut body_start = raw.len();

        let mut offset = 0;
        for line in raw.split_inclusive('\n') {
            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                body_start = offset + line.len();
                break;
            }
            if (line.starts_with(' ') || line.starts_with('\t')) && !headers.is_empty() {
                // Folded continuation of the previous header
                let last = headers.last_mut().unwrap();
                last.1.push(' ');
                last.1.push_str(trimmed.trim());
            } else if let Some(caps) = HEADER_LINE_REGEX.captures(trimmed) {
                headers.push((caps[1].to_lowercase(), caps[2].trim().to_string()));
            } else {
                // Not header-shaped; treat the rest as body
                body_start = offset;
                break;
            }
            offset += line.len();
        }

        let headers = headers
            .into_iter()
            .map(|(name, value)| {
                let decoded = decode_encoded_words(&value);
                (name, decoded)
            })
            .collect();

        Entity {
            headers,
            body: raw[body_start..].to_string(),
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn content_type(&self) -> String {
        self.header("content-type")
            .map(|v| {
                v.split(';')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_lowercase()
            })
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| "text/plain".to_string())
    }

    fn boundary(&self) -> Option<String> {
        let ct = self.header("content-type")?;
        let caps = BOUNDARY_REGEX.captures(ct)?;
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Body with the Content-Transfer-Encoding undone.
    fn decoded_body(&self) -> String {
        let encoding = self
            .header("content-transfer-encoding")
            .map(|v| v.trim().to_lowercase())
            .unwrap_or_default();
        match encoding.as_str() {
            "base64" => {
                let compact: String = self.body.chars().filter(|c| !c.is_whitespace()).collect();
                match BASE64_STANDARD.decode(compact.as_bytes()) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(e) => {
                        log::debug!("base64 body decode failed: {e}");
                        self.body.clone()
                    }
                }
            }
            "quoted-printable" => decode_quoted_printable(&self.body),
            _ => self.body.clone(),
        }
    }
}

/// Walk the MIME structure and return (first text/plain, first text/html),
/// each independently optional.
fn extract_bodies(entity: &Entity) -> (Option<String>, Option<String>) {
    let mut text_body: Option<String> = None;
    let mut html_body: Option<String> = None;
    walk_entity(entity, &mut text_body, &mut html_body);
    (text_body, html_body)
}

fn walk_entity(entity: &Entity, text_body: &mut Option<String>, html_body: &mut Option<String>) {
    let content_type = entity.content_type();

    if content_type.starts_with("multipart/") {
        if let Some(boundary) = entity.boundary() {
            for part in split_multipart(&entity.body, &boundary) {
                let child = Entity::parse(&part);
                walk_entity(&child, text_body, html_body);
            }
        }
        return;
    }

    match content_type.as_str() {
        "text/plain" if text_body.is_none() => *text_body = Some(entity.decoded_body()),
        "text/html" if html_body.is_none() => *html_body = Some(entity.decoded_body()),
        _ => {}
    }
}

/// Split a multipart body into its raw parts, dropping the preamble and
/// epilogue around the boundary delimiters.
fn split_multipart(body: &str, boundary: &str) -> Vec<String> {
    let delimiter = format!("--{boundary}");
    let closing = format!("--{boundary}--");

    let mut parts: Vec<String> = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in body.lines() {
        let trimmed = line.trim_end();
        if trimmed == closing {
            if let Some(lines) = current.take() {
                parts.push(lines.join("\n"));
            }
            break;
        }
        if trimmed == delimiter {
            if let Some(lines) = current.take() {
                parts.push(lines.join("\n"));
            }
            current = Some(Vec::new());
            continue;
        }
        if let Some(ref mut lines) = current {
            lines.push(line);
        }
    }
    if let Some(lines) = current.take() {
        parts.push(lines.join("\n"));
    }
    parts
}

fn decode_quoted_printable(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            // Soft line break
            if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                i += 3;
                continue;
            }
            if bytes.get(i + 1) == Some(&b'\n') {
                i += 2;
                continue;
            }
            if i + 2 < bytes.len() {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Decode RFC 2047 encoded-words in a header value
/// (`=?utf-8?B?...?=` / `=?utf-8?Q?...?=`). Unsupported charsets fall
/// back to lossy UTF-8.
fn decode_encoded_words(value: &str) -> String {
    ENCODED_WORD_REGEX
        .replace_all(value, |caps: &regex::Captures| {
            let encoding = &caps[2];
            let payload = &caps[3];
            let decoded_bytes = match encoding {
                "B" | "b" => BASE64_STANDARD.decode(payload.as_bytes()).ok(),
                _ => Some(
                    decode_quoted_printable(&payload.replace('_', " "))
                        .into_bytes(),
                ),
            };
            match decoded_bytes {
                Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_EML: &str = "From: Alice <alice@example.com>\r\n\
        To: bob@example.org\r\n\
        Subject: Hello\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        Check https://example.com/page please.\r\n";

    #[test]
    fn test_parse_simple_message() {
        let doc = EmailParser::parse(SIMPLE_EML.as_bytes()).unwrap();
        assert_eq!(doc.source, DocumentSource::Eml);
        assert_eq!(
            doc.headers.get("from").map(String::as_str),
            Some("Alice <alice@example.com>")
        );
        assert_eq!(doc.sender.as_deref(), Some("Alice <alice@example.com>"));
        assert_eq!(doc.urls, vec!["https://example.com/page"]);
        assert!(doc.body_html.is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(EmailParser::parse(b"just some random text without headers").is_err());
        assert!(EmailParser::parse(b"").is_err());
    }

    #[test]
    fn test_header_unfolding() {
        let eml = "From: a@b.c\r\nAuthentication-Results: mx.example.com;\r\n\tdkim=pass;\r\n\tspf=pass\r\n\r\nbody\r\n";
        let doc = EmailParser::parse(eml.as_bytes()).unwrap();
        let auth = doc.headers.get("authentication-results").unwrap();
        assert!(auth.contains("dkim=pass"));
        assert!(auth.contains("spf=pass"));
    }

    #[test]
    fn test_non_allowlisted_headers_dropped() {
        let eml = "From: a@b.c\r\nX-Mailer: Foo 1.0\r\n\r\nbody\r\n";
        let doc = EmailParser::parse(eml.as_bytes()).unwrap();
        assert!(!doc.headers.contains_key("x-mailer"));
        assert!(doc.headers.contains_key("from"));
    }

    #[test]
    fn test_multiple_received_retained() {
        let eml = "Received: from a by b\r\nReceived: from c by d\r\nFrom: a@b.c\r\n\r\nbody\r\n";
        let doc = EmailParser::parse(eml.as_bytes()).unwrap();
        assert_eq!(doc.received_all.len(), 2);
        assert_eq!(doc.headers.get("received").unwrap(), "from a by b");
    }

    fn multipart_eml() -> String {
        "From: a@b.c\r\n\
         Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n\
         \r\n\
         --XYZ\r\n\
         Content-Type: text/plain\r\n\
         \r\n\
         Plain part with https://plain.example/x\r\n\
         --XYZ\r\n\
         Content-Type: text/html\r\n\
         \r\n\
         <p><a href=\"https://html.example/y\">https://shown.example/z</a></p>\r\n\
         --XYZ--\r\n"
            .to_string()
    }

    #[test]
    fn test_multipart_prefers_plain_body_and_unions_urls() {
        let doc = EmailParser::parse(multipart_eml().as_bytes()).unwrap();
        assert!(doc.body_text.contains("Plain part"));
        assert!(doc.body_html.is_some());
        assert!(doc.urls.contains(&"https://plain.example/x".to_string()));
        assert!(doc.urls.contains(&"https://html.example/y".to_string()));
        assert_eq!(doc.link_mismatches.len(), 1);
        assert_eq!(doc.link_mismatches[0].href, "https://html.example/y");
    }

    #[test]
    fn test_repeated_body_urls_deduplicated() {
        let eml = "From: a@b.c\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   Go to http://192.168.1.1/login now.\r\n\
                   Again: http://192.168.1.1/login\r\n";
        let doc = EmailParser::parse(eml.as_bytes()).unwrap();
        assert_eq!(doc.urls, vec!["http://192.168.1.1/login"]);
    }

    #[test]
    fn test_html_url_matching_plain_url_kept_once() {
        let eml = "From: a@b.c\r\n\
                   Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n\
                   \r\n\
                   --XYZ\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   See https://example.com/offer\r\n\
                   --XYZ\r\n\
                   Content-Type: text/html\r\n\
                   \r\n\
                   <a href=\"https://example.com/offer\">click</a>\r\n\
                   --XYZ--\r\n";
        let doc = EmailParser::parse(eml.as_bytes()).unwrap();
        assert_eq!(doc.urls, vec!["https://example.com/offer"]);
    }

    #[test]
    fn test_html_only_body_is_stripped() {
        let eml = "From: a@b.c\r\n\
                   Content-Type: text/html\r\n\
                   \r\n\
                   <html><body><p>Urgent notice</p></body></html>\r\n";
        let doc = EmailParser::parse(eml.as_bytes()).unwrap();
        assert_eq!(doc.body_text, "Urgent notice");
        assert!(doc.body_html.is_some());
    }

    #[test]
    fn test_base64_part_decoded() {
        // "Verify at https://example.com/verify"
        let eml = "From: a@b.c\r\n\
                   Content-Type: text/plain\r\n\
                   Content-Transfer-Encoding: base64\r\n\
                   \r\n\
                   VmVyaWZ5IGF0IGh0dHBzOi8vZXhhbXBsZS5jb20vdmVyaWZ5\r\n";
        let doc = EmailParser::parse(eml.as_bytes()).unwrap();
        assert!(doc.body_text.contains("Verify at"));
        assert_eq!(doc.urls, vec!["https://example.com/verify"]);
    }

    #[test]
    fn test_quoted_printable_decoding() {
        assert_eq!(decode_quoted_printable("caf=C3=A9"), "café");
        assert_eq!(decode_quoted_printable("one=\r\nline"), "oneline");
        assert_eq!(decode_quoted_printable("no escapes"), "no escapes");
    }

    #[test]
    fn test_encoded_word_decoding() {
        assert_eq!(
            decode_encoded_words("=?utf-8?B?SGVsbG8gd29ybGQ=?="),
            "Hello world"
        );
        assert_eq!(
            decode_encoded_words("=?utf-8?Q?caf=C3=A9_time?="),
            "café time"
        );
        assert_eq!(decode_encoded_words("plain subject"), "plain subject");
    }
}
