use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use crate::analyzer::Analyzer;
use crate::dns::{self, DnsClient};
use crate::document::{Document, DocumentSource};
use crate::i18n::Language;
use crate::model::{Alarm, Severity};

pub const NAME: &str = "header_analyzer";

lazy_static! {
    static ref DOMAIN_IN_ADDRESS_REGEX: Regex = Regex::new(r"@([\w.-]+)").unwrap();
}

/// Email-authentication checks over the retained message headers.
/// Explicit header results are trusted over DNS lookups; DNS failures
/// surface as missing records, never as analyzer errors.
pub struct HeaderAnalyzer {
    dns: Arc<dyn DnsClient>,
}

impl HeaderAnalyzer {
    pub fn new(dns: Arc<dyn DnsClient>) -> Self {
        HeaderAnalyzer { dns }
    }

    async fn check_spf(&self, document: &Document, domain: &str, lang: Language) -> Option<Alarm> {
        let header_result = dns::parse_spf_header(
            document.headers.get("received-spf").map(String::as_str),
            document
                .headers
                .get("authentication-results")
                .map(String::as_str),
        );

        if let Some(result) = header_result {
            if result.passed {
                return None;
            }
            let (title, description) = alarm_text("spf_fail", lang);
            return Some(Alarm {
                analyzer: NAME,
                alarm_type: "spf_fail",
                severity: Severity::High,
                title: title.to_string(),
                description: description.to_string(),
                details: json!({ "result": result.result, "domain": domain }),
            });
        }

        // No header result; fall back to a TXT lookup.
        let lookup = self.dns.lookup_spf(domain).await;
        if !lookup.exists {
            let (title, description) = alarm_text("spf_missing", lang);
            return Some(Alarm {
                analyzer: NAME,
                alarm_type: "spf_missing",
                severity: Severity::Medium,
                title: title.to_string(),
                description: description.to_string(),
                details: json!({ "domain": domain }),
            });
        }
        None
    }

    fn check_dkim(&self, document: &Document, lang: Language) -> Option<Alarm> {
        let result = dns::parse_dkim_header(
            document
                .headers
                .get("authentication-results")
                .map(String::as_str),
        )?;
        if result.passed {
            return None;
        }
        let (title, description) = alarm_text("dkim_fail", lang);
        Some(Alarm {
            analyzer: NAME,
            alarm_type: "dkim_fail",
            severity: Severity::High,
            title: title.to_string(),
            description: description.to_string(),
            details: json!({ "result": result.result }),
        })
    }

    async fn check_dmarc(&self, domain: &str, lang: Language) -> Option<Alarm> {
        let lookup = self.dns.lookup_dmarc(domain).await;
        if !lookup.exists {
            let (title, description) = alarm_text("dmarc_missing", lang);
            return Some(Alarm {
                analyzer: NAME,
                alarm_type: "dmarc_missing",
                severity: Severity::Low,
                title: title.to_string(),
                description: description.to_string(),
                details: json!({ "domain": domain }),
            });
        }
        if lookup.policy.as_deref() == Some("none") {
            let (title, description) = alarm_text("dmarc_policy_none", lang);
            return Some(Alarm {
                analyzer: NAME,
                alarm_type: "dmarc_policy_none",
                severity: Severity::Medium,
                title: title.to_string(),
                description: description.to_string(),
                details: json!({ "domain": domain, "policy": "none" }),
            });
        }
        // quarantine/reject policies need no finding
        None
    }

    fn check_from_return_path(&self, document: &Document, lang: Language) -> Option<Alarm> {
        let from_domain = document
            .headers
            .get("from")
            .and_then(|v| extract_domain(v))?;
        let return_path_domain = document
            .headers
            .get("return-path")
            .and_then(|v| extract_domain(v))?;

        if from_domain == return_path_domain {
            return None;
        }
        let (title, description) = alarm_text("from_mismatch", lang);
        Some(Alarm {
            analyzer: NAME,
            alarm_type: "from_return_path_mismatch",
            severity: Severity::Medium,
            title: title.to_string(),
            description: description.to_string(),
            details: json!({
                "from_domain": from_domain,
                "return_path_domain": return_path_domain,
            }),
        })
    }
}

#[async_trait]
impl Analyzer for HeaderAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(&self, document: &Document, language: Language) -> anyhow::Result<Vec<Alarm>> {
        if document.source != DocumentSource::Eml || document.headers.is_empty() {
            return Ok(Vec::new());
        }

        let mut alarms = Vec::new();
        let domain = document
            .headers
            .get("from")
            .and_then(|v| extract_domain(v));

        if let Some(ref domain) = domain {
            alarms.extend(self.check_spf(document, domain, language).await);
            alarms.extend(self.check_dkim(document, language));
            alarms.extend(self.check_dmarc(domain, language).await);
        }

        alarms.extend(self.check_from_return_path(document, language));

        Ok(alarms)
    }
}

fn extract_domain(address: &str) -> Option<String> {
    DOMAIN_IN_ADDRESS_REGEX
        .captures(address)
        .map(|caps| caps[1].to_lowercase())
}

fn alarm_text(key: &str, lang: Language) -> (&'static str, &'static str) {
    match (key, lang) {
        ("spf_fail", Language::En) => (
            "SPF check failed",
            "The sender's IP is not authorized by the domain's SPF record.",
        ),
        ("spf_fail", Language::Es) => (
            "Fallo de SPF",
            "La IP del remitente no está autorizada por el registro SPF del dominio.",
        ),
        ("spf_fail", Language::Ca) => (
            "Fallada de SPF",
            "La IP del remitent no està autoritzada pel registre SPF del domini.",
        ),
        ("spf_missing", Language::En) => (
            "No SPF record found",
            "The sender's domain has no SPF record, making it easy to spoof.",
        ),
        ("spf_missing", Language::Es) => (
            "Sin registro SPF",
            "El dominio del remitente no tiene registro SPF, facilitando la suplantación.",
        ),
        ("spf_missing", Language::Ca) => (
            "Sense registre SPF",
            "El domini del remitent no té registre SPF, facilitant la suplantació.",
        ),
        ("dkim_fail", Language::En) => (
            "DKIM signature failed",
            "The email's DKIM signature did not pass verification.",
        ),
        ("dkim_fail", Language::Es) => (
            "Firma DKIM fallida",
            "La firma DKIM del email no pasó la verificación.",
        ),
        ("dkim_fail", Language::Ca) => (
            "Signatura DKIM fallida",
            "La signatura DKIM del correu no ha passat la verificació.",
        ),
        ("dmarc_policy_none", Language::En) => (
            "DMARC policy not enforced",
            "The domain's DMARC policy is set to 'none', offering no protection.",
        ),
        ("dmarc_policy_none", Language::Es) => (
            "Política DMARC no aplicada",
            "La política DMARC del dominio está en 'none', sin protección.",
        ),
        ("dmarc_policy_none", Language::Ca) => (
            "Política DMARC no aplicada",
            "La política DMARC del domini està en 'none', sense protecció.",
        ),
        ("dmarc_missing", Language::En) => (
            "No DMARC record found",
            "The sender's domain has no DMARC record.",
        ),
        ("dmarc_missing", Language::Es) => (
            "Sin registro DMARC",
            "El dominio del remitente no tiene registro DMARC.",
        ),
        ("dmarc_missing", Language::Ca) => (
            "Sense registre DMARC",
            "El domini del remitent no té registre DMARC.",
        ),
        ("from_mismatch", Language::En) => (
            "From/Return-Path mismatch",
            "The From address differs from the Return-Path, which may indicate spoofing.",
        ),
        ("from_mismatch", Language::Es) => (
            "From/Return-Path no coinciden",
            "La dirección From difiere del Return-Path, lo que puede indicar suplantación.",
        ),
        ("from_mismatch", Language::Ca) => (
            "From/Return-Path no coincideixen",
            "L'adreça From difereix del Return-Path, cosa que pot indicar suplantació.",
        ),
        _ => ("Unknown finding", "Unknown finding."),
    }
}
