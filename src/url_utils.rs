use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref URL_REGEX: Regex = Regex::new(r#"https?://[^\s<>"')\]}]+"#).unwrap();
    static ref IPV4_REGEX: Regex = Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").unwrap();
}

/// Known URL-shortener hosts. Versioned data, not logic.
pub const URL_SHORTENERS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "t.co",
    "goo.gl",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "j.mp",
    "dlvr.it",
    "rb.gy",
    "cutt.ly",
    "shorturl.at",
    "tiny.cc",
    "lnkd.in",
    "soo.gd",
    "s2r.co",
];

/// Brand domains the typosquatting check compares against.
pub const BRAND_DOMAINS: &[&str] = &[
    "paypal.com",
    "apple.com",
    "microsoft.com",
    "google.com",
    "amazon.com",
    "netflix.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "linkedin.com",
    "wellsfargo.com",
    "chase.com",
    "citibank.com",
    "hsbc.com",
    "santander.com",
    "bbva.com",
    "caixabank.es",
    "bancsabadell.com",
    "ing.com",
    "openbank.es",
    "bankofamerica.com",
];

/// Two-part public suffixes the registrable-domain split must not cut
/// through. Covers the TLDs appearing in the brand and shortener lists
/// plus common country registries.
const MULTI_PART_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "com.br", "com.mx", "com.ar",
    "co.jp", "co.in", "co.nz", "com.es",
];

/// Maximum edit distance at which a domain label counts as a lookalike.
pub const TYPOSQUAT_DISTANCE: usize = 2;

/// Extract all absolute http(s) URLs from free text.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// True when the URL's host is a bare dotted-quad IPv4 address.
pub fn is_ip_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(|h| IPV4_REGEX.is_match(h))
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// True when the URL's host is a known shortener service.
pub fn is_shortened_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(|h| URL_SHORTENERS.contains(&h.to_lowercase().as_str()))
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// Split a host into (second-level label, registrable domain), e.g.
/// "mail.paypa1.com" -> ("paypa1", "paypa1.com"). Returns None for
/// hosts without enough labels (or IP literals).
pub fn registrable_domain(host: &str) -> Option<(String, String)> {
    let host = host.to_lowercase();
    if IPV4_REGEX.is_match(&host) {
        return None;
    }
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    if MULTI_PART_SUFFIXES.contains(&last_two.as_str()) {
        if labels.len() < 3 {
            return None;
        }
        let sld = labels[labels.len() - 3].to_string();
        let registrable = format!("{}.{}", sld, last_two);
        Some((sld, registrable))
    } else {
        let sld = labels[labels.len() - 2].to_string();
        Some((sld, last_two))
    }
}

/// Edit distance between two strings, char-wise.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];
    for (i, ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Check whether the URL's registrable domain is a near-miss of a known
/// brand. Exact brand domains and shorteners are skipped; otherwise the
/// first brand whose second-level label is within edit distance (and not
/// identical) is reported.
pub fn check_typosquatting(url: &str) -> Option<&'static str> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let (sld, registrable) = registrable_domain(host)?;

    if BRAND_DOMAINS.contains(&registrable.as_str()) || URL_SHORTENERS.contains(&registrable.as_str())
    {
        return None;
    }

    for brand in BRAND_DOMAINS {
        let brand_sld = match registrable_domain(brand) {
            Some((s, _)) => s,
            None => continue,
        };
        if sld != brand_sld && levenshtein(&sld, &brand_sld) <= TYPOSQUAT_DISTANCE {
            return Some(brand);
        }
    }
    None
}
