use async_trait::async_trait;

use crate::document::Document;
use crate::i18n::Language;
use crate::model::Alarm;

/// One independent heuristic check over a normalized document. Analyzers
/// never see each other's output; the pipeline concatenates their alarms.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Stable identifier used in alarm attribution and run metadata.
    fn name(&self) -> &'static str;

    /// Inspect the document and return zero or more alarms, with all
    /// user-facing text rendered in the requested UI language.
    async fn analyze(&self, document: &Document, language: Language) -> anyhow::Result<Vec<Alarm>>;
}
