use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::content_analyzer::ContentAnalyzer;
use crate::dns::DnsClient;
use crate::document::Document;
use crate::header_analyzer::HeaderAnalyzer;
use crate::i18n::Language;
use crate::model::{compute_risk_level, Alarm, AnalysisReport, ReportMetadata};
use crate::rate_limiter::RateLimiter;
use crate::reputation_analyzer::ReputationAnalyzer;
use crate::url_analyzer::UrlAnalyzer;

const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Runs the fixed analyzer list over one document and reduces the
/// findings to a verdict. The list order is significant only for
/// in-analyzer de-duplication; the analyzers themselves are independent.
pub struct Pipeline {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Pipeline {
    pub fn new(config: &Config, dns: Arc<dyn DnsClient>) -> anyhow::Result<Self> {
        let virustotal_limiter = Arc::new(RateLimiter::new(
            config.virustotal_requests_per_minute,
            RATE_LIMIT_WINDOW,
        ));
        Ok(Pipeline {
            analyzers: vec![
                Box::new(UrlAnalyzer),
                Box::new(ContentAnalyzer),
                Box::new(HeaderAnalyzer::new(dns)),
                Box::new(ReputationAnalyzer::new(config, virustotal_limiter)?),
            ],
        })
    }

    /// Custom analyzer list, used by tests.
    pub fn with_analyzers(analyzers: Vec<Box<dyn Analyzer>>) -> Self {
        Pipeline { analyzers }
    }

    /// Run every analyzer, isolating failures: an erroring analyzer
    /// contributes no alarms and is dropped from the run metadata, but
    /// the run as a whole always produces a report.
    pub async fn run(&self, document: &Document, language: Language) -> AnalysisReport {
        let start = Instant::now();
        let mut alarms: Vec<Alarm> = Vec::new();
        let mut analyzers_run: Vec<&'static str> = Vec::new();

        for analyzer in &self.analyzers {
            match analyzer.analyze(document, language).await {
                Ok(found) => {
                    log::debug!("{} produced {} alarm(s)", analyzer.name(), found.len());
                    alarms.extend(found);
                    analyzers_run.push(analyzer.name());
                }
                Err(e) => {
                    log::warn!("analyzer {} failed, skipping: {e}", analyzer.name());
                }
            }
        }

        let risk_level = compute_risk_level(&alarms);
        AnalysisReport {
            success: true,
            risk_level,
            risk_level_label: risk_level.label(language).to_string(),
            alarms,
            metadata: ReportMetadata {
                analyzers_run,
                analysis_time_ms: start.elapsed().as_millis() as u64,
            },
        }
    }
}
