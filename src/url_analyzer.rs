use async_trait::async_trait;
use serde_json::json;

use crate::analyzer::Analyzer;
use crate::document::Document;
use crate::i18n::Language;
use crate::model::{Alarm, Severity};
use crate::url_utils;

pub const NAME: &str = "url_analyzer";

/// Purely syntactic URL checks: IP-literal hosts, shortener services,
/// brand lookalike domains and link-text mismatches.
pub struct UrlAnalyzer;

#[async_trait]
impl Analyzer for UrlAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(&self, document: &Document, language: Language) -> anyhow::Result<Vec<Alarm>> {
        let mut alarms = Vec::new();

        for url in &document.urls {
            if url_utils::is_ip_url(url) {
                let (title, description) = alarm_text("url_ip", language);
                alarms.push(Alarm {
                    analyzer: NAME,
                    alarm_type: "url_ip_detected",
                    severity: Severity::High,
                    title: title.to_string(),
                    description: description.to_string(),
                    details: json!({ "url": url }),
                });
            }

            if url_utils::is_shortened_url(url) {
                let (title, description) = alarm_text("url_shortener", language);
                alarms.push(Alarm {
                    analyzer: NAME,
                    alarm_type: "url_shortener_detected",
                    severity: Severity::Medium,
                    title: title.to_string(),
                    description: description.to_string(),
                    details: json!({ "url": url }),
                });
            }

            if let Some(brand) = url_utils::check_typosquatting(url) {
                let (title, description) = alarm_text("typosquatting", language);
                alarms.push(Alarm {
                    analyzer: NAME,
                    alarm_type: "typosquatting_detected",
                    severity: Severity::High,
                    title: title.to_string(),
                    description: description.to_string(),
                    details: json!({ "url": url, "similar_to": brand }),
                });
            }
        }

        for mismatch in &document.link_mismatches {
            let (title, description) = alarm_text("url_mismatch", language);
            alarms.push(Alarm {
                analyzer: NAME,
                alarm_type: "url_text_mismatch",
                severity: Severity::High,
                title: title.to_string(),
                description: description.to_string(),
                details: json!({
                    "visible_text": mismatch.visible_text,
                    "actual_href": mismatch.href,
                }),
            });
        }

        Ok(alarms)
    }
}

fn alarm_text(key: &str, lang: Language) -> (&'static str, &'static str) {
    match (key, lang) {
        ("url_ip", Language::En) => (
            "IP address in URL",
            "The URL uses an IP address instead of a domain name, which is common in phishing.",
        ),
        ("url_ip", Language::Es) => (
            "IP en URL",
            "La URL usa una dirección IP en vez de un dominio, algo común en phishing.",
        ),
        ("url_ip", Language::Ca) => (
            "IP a la URL",
            "La URL utilitza una adreça IP en lloc d'un domini, cosa habitual en phishing.",
        ),
        ("url_shortener", Language::En) => (
            "URL shortener detected",
            "The link uses a URL shortening service, which can hide the real destination.",
        ),
        ("url_shortener", Language::Es) => (
            "URL acortada detectada",
            "El enlace usa un servicio de acortamiento que puede ocultar el destino real.",
        ),
        ("url_shortener", Language::Ca) => (
            "URL escurçada detectada",
            "L'enllaç usa un servei d'escurçament que pot amagar la destinació real.",
        ),
        ("url_mismatch", Language::En) => (
            "Link text/URL mismatch",
            "The visible text shows a different URL than where the link actually goes.",
        ),
        ("url_mismatch", Language::Es) => (
            "Texto/URL no coinciden",
            "El texto visible muestra una URL diferente a donde realmente lleva el enlace.",
        ),
        ("url_mismatch", Language::Ca) => (
            "Text/URL no coincideixen",
            "El text visible mostra una URL diferent d'on realment porta l'enllaç.",
        ),
        ("typosquatting", Language::En) => (
            "Typosquatting domain detected",
            "The domain closely resembles a known brand but is misspelled, a common phishing tactic.",
        ),
        ("typosquatting", Language::Es) => (
            "Dominio typosquatting detectado",
            "El dominio se parece mucho a una marca conocida pero está mal escrito, táctica común de phishing.",
        ),
        ("typosquatting", Language::Ca) => (
            "Domini typosquatting detectat",
            "El domini s'assembla molt a una marca coneguda però està mal escrit, tàctica comuna de phishing.",
        ),
        _ => ("Unknown finding", "Unknown finding."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentSource, LinkMismatch};

    fn doc_with_urls(urls: &[&str]) -> Document {
        let mut doc = Document::empty(DocumentSource::PlainText);
        doc.urls = urls.iter().map(|u| u.to_string()).collect();
        doc
    }

    #[tokio::test]
    async fn test_ip_url_flagged() {
        let doc = doc_with_urls(&["http://192.168.1.1/login"]);
        let alarms = UrlAnalyzer.analyze(&doc, Language::En).await.unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].alarm_type, "url_ip_detected");
        assert_eq!(alarms[0].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_shortener_flagged() {
        let doc = doc_with_urls(&["https://bit.ly/abc123"]);
        let alarms = UrlAnalyzer.analyze(&doc, Language::En).await.unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].alarm_type, "url_shortener_detected");
        assert_eq!(alarms[0].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn test_typosquatting_flagged_with_brand() {
        let doc = doc_with_urls(&["https://paypa1.com/login"]);
        let alarms = UrlAnalyzer.analyze(&doc, Language::En).await.unwrap();
        assert!(alarms
            .iter()
            .any(|a| a.alarm_type == "typosquatting_detected"
                && a.details["similar_to"] == "paypal.com"));
    }

    #[tokio::test]
    async fn test_clean_url_no_findings() {
        let doc = doc_with_urls(&["https://google.com/search"]);
        let alarms = UrlAnalyzer.analyze(&doc, Language::En).await.unwrap();
        assert!(alarms.is_empty());
    }

    #[tokio::test]
    async fn test_empty_document_no_findings() {
        let doc = Document::empty(DocumentSource::PlainText);
        let alarms = UrlAnalyzer.analyze(&doc, Language::En).await.unwrap();
        assert!(alarms.is_empty());
    }

    #[tokio::test]
    async fn test_mismatch_preserves_both_values() {
        let mut doc = Document::empty(DocumentSource::PlainText);
        doc.link_mismatches = vec![LinkMismatch {
            href: "https://evil.com/steal".to_string(),
            visible_text: "https://www.paypal.com/secure".to_string(),
        }];
        let alarms = UrlAnalyzer.analyze(&doc, Language::En).await.unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].alarm_type, "url_text_mismatch");
        assert_eq!(alarms[0].details["actual_href"], "https://evil.com/steal");
        assert_eq!(
            alarms[0].details["visible_text"],
            "https://www.paypal.com/secure"
        );
    }

    #[tokio::test]
    async fn test_localized_titles() {
        let doc = doc_with_urls(&["https://bit.ly/abc123"]);
        let alarms = UrlAnalyzer.analyze(&doc, Language::Es).await.unwrap();
        assert_eq!(alarms[0].title, "URL acortada detectada");
    }
}
