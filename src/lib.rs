pub mod analyzer;
pub mod config;
pub mod content_analyzer;
pub mod dns;
pub mod document;
pub mod email_parser;
pub mod header_analyzer;
pub mod html;
pub mod i18n;
pub mod model;
pub mod pipeline;
pub mod rate_limiter;
pub mod reputation_analyzer;
pub mod server;
pub mod text_parser;
pub mod url_analyzer;
pub mod url_utils;

pub use analyzer::Analyzer;
pub use config::Config;
pub use document::{Document, DocumentSource};
pub use model::{compute_risk_level, Alarm, AnalysisReport, RiskLevel, Severity};
pub use pipeline::Pipeline;
