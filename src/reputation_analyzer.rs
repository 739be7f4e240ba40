use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::*;
use serde_json::json;

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::document::Document;
use crate::i18n::Language;
use crate::model::{Alarm, Severity};
use crate::rate_limiter::RateLimiter;

pub const NAME: &str = "reputation_analyzer";

/// Optional lookups against external URL-reputation services. Every
/// service is fail-open: network errors, non-success responses and
/// unexpected payload shapes all produce no finding rather than aborting
/// the run. No retries anywhere; a failed attempt is a skipped attempt.
pub struct ReputationAnalyzer {
    client: reqwest::Client,
    virustotal_api_key: Option<String>,
    safebrowsing_api_key: Option<String>,
    phishtank_api_key: Option<String>,
    virustotal_limiter: Arc<RateLimiter>,
}

impl ReputationAnalyzer {
    pub fn new(config: &Config, virustotal_limiter: Arc<RateLimiter>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.reputation_timeout_seconds))
            .user_agent(concat!("phishbuster/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(ReputationAnalyzer {
            client,
            virustotal_api_key: config.virustotal_api_key.clone(),
            safebrowsing_api_key: config.safebrowsing_api_key.clone(),
            phishtank_api_key: config.phishtank_api_key.clone(),
            virustotal_limiter,
        })
    }

    async fn check_virustotal(&self, url: &str, api_key: &str, lang: Language) -> Option<Alarm> {
        // The shared limiter spans all URLs of all concurrent runs;
        // over-limit requests are skipped, not queued.
        if !self.virustotal_limiter.acquire() {
            log::debug!("VirusTotal rate limit reached, skipping {url}");
            return None;
        }

        let url_id = BASE64_URL_SAFE_NO_PAD.encode(url.as_bytes());
        let response = self
            .client
            .get(format!("https://www.virustotal.com/api/v3/urls/{url_id}"))
            .header("x-apikey", api_key)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            log::debug!("VirusTotal returned {} for {url}", response.status());
            return None;
        }
        let body: serde_json::Value = response.json().await.ok()?;

        let stats = &body["data"]["attributes"]["last_analysis_stats"];
        let malicious = stats["malicious"].as_u64().unwrap_or(0);
        let suspicious = stats["suspicious"].as_u64().unwrap_or(0);
        let severity = virustotal_verdict(malicious, suspicious)?;

        let (title, description) = alarm_text("virustotal", lang);
        Some(Alarm {
            analyzer: NAME,
            alarm_type: "virustotal_malicious",
            severity,
            title: title.to_string(),
            description: description.to_string(),
            details: json!({
                "url": url,
                "malicious_detections": malicious,
                "suspicious_detections": suspicious,
            }),
        })
    }

    async fn check_safebrowsing(&self, url: &str, api_key: &str, lang: Language) -> Option<Alarm> {
        let request_body = json!({
            "client": { "clientId": "phishbuster", "clientVersion": env!("CARGO_PKG_VERSION") },
            "threatInfo": {
                "threatTypes": ["MALWARE", "SOCIAL_ENGINEERING", "UNWANTED_SOFTWARE"],
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{ "url": url }],
            },
        });

        let response = self
            .client
            .post(format!(
                "https://safebrowsing.googleapis.com/v4/threatMatches:find?key={api_key}"
            ))
            .json(&request_body)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            log::debug!("Safe Browsing returned {} for {url}", response.status());
            return None;
        }
        let body: serde_json::Value = response.json().await.ok()?;

        let matches = body["matches"].as_array()?;
        if matches.is_empty() {
            return None;
        }
        let threat_type = matches[0]["threatType"].as_str().unwrap_or("UNKNOWN");

        let (title, description) = alarm_text("safebrowsing", lang);
        Some(Alarm {
            analyzer: NAME,
            alarm_type: "safebrowsing_threat",
            severity: Severity::Critical,
            title: title.to_string(),
            description: description.to_string(),
            details: json!({ "url": url, "threat_type": threat_type }),
        })
    }

    async fn check_phishtank(&self, url: &str, api_key: &str, lang: Language) -> Option<Alarm> {
        let response = self
            .client
            .post("https://checkurl.phishtank.com/checkurl/")
            .form(&[("url", url), ("format", "json"), ("app_key", api_key)])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            log::debug!("PhishTank returned {} for {url}", response.status());
            return None;
        }
        let body: serde_json::Value = response.json().await.ok()?;

        let results = &body["results"];
        let confirmed = results["in_database"].as_bool().unwrap_or(false)
            && results["verified"].as_bool().unwrap_or(false)
            && results["valid"].as_bool().unwrap_or(false);
        if !confirmed {
            return None;
        }

        let (title, description) = alarm_text("phishtank", lang);
        Some(Alarm {
            analyzer: NAME,
            alarm_type: "phishtank_phishing",
            severity: Severity::Critical,
            title: title.to_string(),
            description: description.to_string(),
            details: json!({ "url": url, "phish_id": results["phish_id"] }),
        })
    }
}

#[async_trait]
impl Analyzer for ReputationAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(&self, document: &Document, language: Language) -> anyhow::Result<Vec<Alarm>> {
        let mut alarms = Vec::new();
        if document.urls.is_empty() {
            return Ok(alarms);
        }

        for url in &document.urls {
            if let Some(key) = self.virustotal_api_key.as_deref() {
                alarms.extend(self.check_virustotal(url, key, language).await);
            }
            if let Some(key) = self.safebrowsing_api_key.as_deref() {
                alarms.extend(self.check_safebrowsing(url, key, language).await);
            }
            if let Some(key) = self.phishtank_api_key.as_deref() {
                alarms.extend(self.check_phishtank(url, key, language).await);
            }
        }

        Ok(alarms)
    }
}

/// VirusTotal verdict thresholds: 3 malicious or 5 suspicious detections
/// make a finding, 5 malicious escalate it to critical.
fn virustotal_verdict(malicious: u64, suspicious: u64) -> Option<Severity> {
    if malicious >= 5 {
        Some(Severity::Critical)
    } else if malicious >= 3 || suspicious >= 5 {
        Some(Severity::High)
    } else {
        None
    }
}

fn alarm_text(key: &str, lang: Language) -> (&'static str, &'static str) {
    match (key, lang) {
        ("virustotal", Language::En) => (
            "VirusTotal: Malicious URL",
            "The URL was flagged as malicious by multiple security vendors.",
        ),
        ("virustotal", Language::Es) => (
            "VirusTotal: URL maliciosa",
            "La URL fue marcada como maliciosa por múltiples proveedores de seguridad.",
        ),
        ("virustotal", Language::Ca) => (
            "VirusTotal: URL maliciosa",
            "La URL ha estat marcada com a maliciosa per múltiples proveïdors de seguretat.",
        ),
        ("safebrowsing", Language::En) => (
            "Google Safe Browsing: Threat detected",
            "Google has identified this URL as a threat.",
        ),
        ("safebrowsing", Language::Es) => (
            "Google Safe Browsing: Amenaza detectada",
            "Google ha identificado esta URL como una amenaza.",
        ),
        ("safebrowsing", Language::Ca) => (
            "Google Safe Browsing: Amenaça detectada",
            "Google ha identificat aquesta URL com una amenaça.",
        ),
        ("phishtank", Language::En) => (
            "PhishTank: Known phishing URL",
            "This URL is listed in the PhishTank phishing database.",
        ),
        ("phishtank", Language::Es) => (
            "PhishTank: URL de phishing conocida",
            "Esta URL está listada en la base de datos de phishing de PhishTank.",
        ),
        ("phishtank", Language::Ca) => (
            "PhishTank: URL de phishing coneguda",
            "Aquesta URL està llistada a la base de dades de phishing de PhishTank.",
        ),
        _ => ("Unknown finding", "Unknown finding."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentSource;

    #[test]
    fn test_virustotal_verdict_thresholds() {
        assert_eq!(virustotal_verdict(0, 0), None);
        assert_eq!(virustotal_verdict(2, 4), None);
        assert_eq!(virustotal_verdict(3, 0), Some(Severity::High));
        assert_eq!(virustotal_verdict(0, 5), Some(Severity::High));
        assert_eq!(virustotal_verdict(5, 0), Some(Severity::Critical));
        assert_eq!(virustotal_verdict(12, 3), Some(Severity::Critical));
    }

    #[tokio::test]
    async fn test_no_credentials_means_no_findings() {
        let config = Config::default();
        let limiter = Arc::new(RateLimiter::new(4, Duration::from_secs(60)));
        let analyzer = ReputationAnalyzer::new(&config, limiter).unwrap();

        let mut doc = Document::empty(DocumentSource::PlainText);
        doc.urls = vec!["https://example.com/x".to_string()];
        let alarms = analyzer.analyze(&doc, Language::En).await.unwrap();
        assert!(alarms.is_empty());
    }

    #[tokio::test]
    async fn test_no_urls_short_circuits() {
        let config = Config::default();
        let limiter = Arc::new(RateLimiter::new(4, Duration::from_secs(60)));
        let analyzer = ReputationAnalyzer::new(&config, limiter).unwrap();

        let doc = Document::empty(DocumentSource::PlainText);
        let alarms = analyzer.analyze(&doc, Language::En).await.unwrap();
        assert!(alarms.is_empty());
    }
}
