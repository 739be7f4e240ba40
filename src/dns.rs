use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use lazy_static::lazy_static;
use regex::Regex;

const LOOKUP_TIMEOUT_SECONDS: u64 = 5;

lazy_static! {
    static ref DMARC_POLICY_REGEX: Regex = Regex::new(r"p=(\w+)").unwrap();
    static ref AUTH_SPF_REGEX: Regex = Regex::new(r"(?i)spf=(\w+)").unwrap();
    static ref AUTH_DKIM_REGEX: Regex = Regex::new(r"(?i)dkim=(\w+)").unwrap();
    static ref LEADING_WORD_REGEX: Regex = Regex::new(r"^(\w+)").unwrap();
}

/// Outcome of an SPF TXT lookup. Resolution failures never raise; they
/// come back as `exists: false` with the error recorded.
#[derive(Debug, Clone, Default)]
pub struct SpfLookup {
    pub exists: bool,
    pub record: Option<String>,
    pub error: Option<String>,
}

/// Outcome of a DMARC TXT lookup on `_dmarc.<domain>`.
#[derive(Debug, Clone, Default)]
pub struct DmarcLookup {
    pub exists: bool,
    pub record: Option<String>,
    pub policy: Option<String>,
    pub error: Option<String>,
}

/// Result of parsing an SPF or DKIM outcome from message headers.
#[derive(Debug, Clone)]
pub struct HeaderAuthResult {
    pub result: String,
    pub passed: bool,
}

/// DNS record lookups consumed by the header analyzer. The trait seam
/// keeps the analyzer testable without a network.
#[async_trait]
pub trait DnsClient: Send + Sync {
    async fn lookup_spf(&self, domain: &str) -> SpfLookup;
    async fn lookup_dmarc(&self, domain: &str) -> DmarcLookup;
}

/// Production resolver on top of hickory's tokio resolver. Lookups carry
/// a bounded timeout; timeouts and failures degrade to "record absent".
pub struct HickoryDnsClient {
    resolver: TokioAsyncResolver,
}

impl HickoryDnsClient {
    pub fn new() -> anyhow::Result<Self> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
        Ok(HickoryDnsClient { resolver })
    }

    async fn txt_records(&self, name: &str) -> Result<Vec<String>, String> {
        let lookup = self.resolver.txt_lookup(name.to_string());
        match tokio::time::timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECONDS), lookup).await {
            Ok(Ok(response)) => Ok(response
                .iter()
                .map(|txt| {
                    txt.iter()
                        .map(|data| String::from_utf8_lossy(data).into_owned())
                        .collect::<String>()
                })
                .collect()),
            Ok(Err(e)) => {
                log::debug!("TXT lookup failed for {name}: {e}");
                Err(e.to_string())
            }
            Err(_) => {
                log::debug!("TXT lookup timed out for {name}");
                Err("DNS lookup timed out".to_string())
            }
        }
    }
}

#[async_trait]
impl DnsClient for HickoryDnsClient {
    async fn lookup_spf(&self, domain: &str) -> SpfLookup {
        match self.txt_records(domain).await {
            Ok(records) => {
                for record in records {
                    if record.starts_with("v=spf1") {
                        return SpfLookup {
                            exists: true,
                            record: Some(record),
                            error: None,
                        };
                    }
                }
                SpfLookup::default()
            }
            Err(e) => SpfLookup {
                error: Some(e),
                ..Default::default()
            },
        }
    }

    async fn lookup_dmarc(&self, domain: &str) -> DmarcLookup {
        let dmarc_name = format!("_dmarc.{domain}");
        match self.txt_records(&dmarc_name).await {
            Ok(records) => {
                for record in records {
                    if record.starts_with("v=DMARC1") {
                        let policy = DMARC_POLICY_REGEX
                            .captures(&record)
                            .map(|caps| caps[1].to_lowercase())
                            .unwrap_or_else(|| "none".to_string());
                        return DmarcLookup {
                            exists: true,
                            record: Some(record),
                            policy: Some(policy),
                            error: None,
                        };
                    }
                }
                DmarcLookup::default()
            }
            Err(e) => DmarcLookup {
                error: Some(e),
                ..Default::default()
            },
        }
    }
}

/// Parse an SPF outcome from Received-SPF (first word is the result) or,
/// failing that, the spf= clause of Authentication-Results.
pub fn parse_spf_header(
    received_spf: Option<&str>,
    auth_results: Option<&str>,
) -> Option<HeaderAuthResult> {
    if let Some(value) = received_spf {
        if let Some(caps) = LEADING_WORD_REGEX.captures(value.trim()) {
            let result = caps[1].to_lowercase();
            let passed = result == "pass";
            return Some(HeaderAuthResult { result, passed });
        }
    }
    if let Some(value) = auth_results {
        if let Some(caps) = AUTH_SPF_REGEX.captures(value) {
            let result = caps[1].to_lowercase();
            let passed = result == "pass";
            return Some(HeaderAuthResult { result, passed });
        }
    }
    None
}

/// Parse the dkim= clause of Authentication-Results. DKIM has no DNS
/// fallback; an absent clause means no result.
pub fn parse_dkim_header(auth_results: Option<&str>) -> Option<HeaderAuthResult> {
    let value = auth_results?;
    let caps = AUTH_DKIM_REGEX.captures(value)?;
    let result = caps[1].to_lowercase();
    let passed = result == "pass";
    Some(HeaderAuthResult { result, passed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spf_from_received_spf() {
        let parsed = parse_spf_header(Some("Fail (sender IP is 1.2.3.4)"), None).unwrap();
        assert_eq!(parsed.result, "fail");
        assert!(!parsed.passed);

        let parsed = parse_spf_header(Some("pass (google.com: domain designates...)"), None).unwrap();
        assert!(parsed.passed);
    }

    #[test]
    fn test_parse_spf_from_auth_results() {
        let auth = "mx.example.com; spf=softfail smtp.mailfrom=example.org; dkim=pass";
        let parsed = parse_spf_header(None, Some(auth)).unwrap();
        assert_eq!(parsed.result, "softfail");
        assert!(!parsed.passed);
    }

    #[test]
    fn test_parse_spf_absent() {
        assert!(parse_spf_header(None, None).is_none());
        assert!(parse_spf_header(None, Some("dkim=pass")).is_none());
    }

    #[test]
    fn test_parse_dkim() {
        let parsed = parse_dkim_header(Some("mx.example.com; dkim=pass header.d=example.com"));
        assert!(parsed.unwrap().passed);

        let parsed = parse_dkim_header(Some("mx.example.com; dkim=fail")).unwrap();
        assert_eq!(parsed.result, "fail");
        assert!(!parsed.passed);

        assert!(parse_dkim_header(Some("spf=pass only")).is_none());
        assert!(parse_dkim_header(None).is_none());
    }
}
