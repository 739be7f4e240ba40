use lazy_static::lazy_static;
use regex::Regex;

/// One anchor tag pulled out of an HTML fragment.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub href: String,
    pub visible_text: String,
}

lazy_static! {
    static ref ANCHOR_REGEX: Regex = Regex::new(
        r#"(?is)<a\s[^>]*?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))[^>]*>(.*?)</a>"#
    )
    .unwrap();
    static ref SCRIPT_STYLE_REGEX: Regex =
        Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap();
    static ref BLOCK_END_REGEX: Regex =
        Regex::new(r"(?i)<(br\s*/?|/p|/div|/tr|/li|/h[1-6]|/table)>").unwrap();
    static ref TAG_REGEX: Regex = Regex::new(r"(?s)<[^>]+>").unwrap();
    static ref BLANK_LINES_REGEX: Regex = Regex::new(r"\n{2,}").unwrap();
    static ref SPACE_RUN_REGEX: Regex = Regex::new(r"[ \t]{2,}").unwrap();
}

/// Extract every anchor with an href from an HTML fragment. Visible text
/// is the anchor's inner content with any nested markup stripped.
pub fn extract_anchors(html: &str) -> Vec<Anchor> {
    ANCHOR_REGEX
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))?
                .as_str()
                .trim()
                .to_string();
            let inner = caps.get(4).map(|m| m.as_str()).unwrap_or("");
            let visible_text = strip_tags(inner).trim().to_string();
            Some(Anchor { href, visible_text })
        })
        .collect()
}

/// Reduce HTML to its text content: scripts and styles dropped, block
/// boundaries turned into newlines, tags removed, common entities decoded.
pub fn strip_tags(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE_REGEX.replace_all(html, " ");
    let with_breaks = BLOCK_END_REGEX.replace_all(&without_scripts, "\n");
    let without_tags = TAG_REGEX.replace_all(&with_breaks, " ");
    let decoded = decode_entities(&without_tags);

    let collapsed = SPACE_RUN_REGEX.replace_all(&decoded, " ");
    let joined = collapsed
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_LINES_REGEX
        .replace_all(&joined, "\n")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
