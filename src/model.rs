use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Severity of one finding. Ordering matters: the aggregation cap uses
/// the highest severity present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric weight used by the score-based aggregation.
    pub fn score(&self) -> u32 {
        match self {
            Severity::Info => 1,
            Severity::Low => 2,
            Severity::Medium => 5,
            Severity::High => 10,
            Severity::Critical => 20,
        }
    }

    /// The risk level one finding of this severity justifies on its own.
    pub fn risk_cap(&self) -> RiskLevel {
        match self {
            Severity::Info | Severity::Low => RiskLevel::Low,
            Severity::Medium => RiskLevel::Medium,
            Severity::High => RiskLevel::High,
            Severity::Critical => RiskLevel::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn label(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::En, RiskLevel::Low) => "Low",
            (Language::En, RiskLevel::Medium) => "Medium",
            (Language::En, RiskLevel::High) => "High",
            (Language::En, RiskLevel::Critical) => "Critical",
            (Language::Es, RiskLevel::Low) => "Bajo",
            (Language::Es, RiskLevel::Medium) => "Medio",
            (Language::Es, RiskLevel::High) => "Alto",
            (Language::Es, RiskLevel::Critical) => "Crítico",
            (Language::Ca, RiskLevel::Low) => "Baix",
            (Language::Ca, RiskLevel::Medium) => "Mitjà",
            (Language::Ca, RiskLevel::High) => "Alt",
            (Language::Ca, RiskLevel::Critical) => "Crític",
        }
    }
}

/// One typed, severity-rated piece of evidence produced by an analyzer.
/// Pure data: no identity beyond its fields, no lifecycle beyond a single
/// pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Alarm {
    pub analyzer: &'static str,
    pub alarm_type: &'static str,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub details: serde_json::Value,
}

impl Alarm {
    pub fn score(&self) -> u32 {
        self.severity.score()
    }
}

/// Final outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub success: bool,
    pub risk_level: RiskLevel,
    pub risk_level_label: String,
    pub alarms: Vec<Alarm>,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub analyzers_run: Vec<&'static str>,
    pub analysis_time_ms: u64,
}

/// Reduce a set of alarms to one risk level.
///
/// Score path: weights summed, thresholds 5/15/30 for MEDIUM/HIGH/CRITICAL.
/// Cap: the result never exceeds the risk level implied by the single
/// worst alarm, so a pile of low-severity findings cannot escalate past
/// what the strongest individual signal justifies.
pub fn compute_risk_level(alarms: &[Alarm]) -> RiskLevel {
    if alarms.is_empty() {
        return RiskLevel::Low;
    }

    let total: u32 = alarms.iter().map(|a| a.score()).sum();
    let score_risk = if total >= 30 {
        RiskLevel::Critical
    } else if total >= 15 {
        RiskLevel::High
    } else if total >= 5 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let max_severity = alarms
        .iter()
        .map(|a| a.severity)
        .max()
        .unwrap_or(Severity::Info);
    let severity_cap = max_severity.risk_cap();

    score_risk.min(severity_cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm(severity: Severity) -> Alarm {
        Alarm {
            analyzer: "test",
            alarm_type: "test_alarm",
            severity,
            title: "test".to_string(),
            description: "test".to_string(),
            details: serde_json::json!({}),
        }
    }

    #[test]
    fn test_no_alarms_is_low() {
        assert_eq!(compute_risk_level(&[]), RiskLevel::Low);
    }

    #[test]
    fn test_single_critical_is_critical() {
        assert_eq!(
            compute_risk_level(&[alarm(Severity::Critical)]),
            RiskLevel::Critical
        );
    }

    #[test]
    fn test_three_highs_capped_to_high() {
        // 3 x 10 = 30 puts the score at CRITICAL, but the worst single
        // alarm is HIGH, so the cap holds the verdict at HIGH.
        let alarms = vec![
            alarm(Severity::High),
            alarm(Severity::High),
            alarm(Severity::High),
        ];
        assert_eq!(compute_risk_level(&alarms), RiskLevel::High);
    }

    #[test]
    fn test_single_medium_is_medium() {
        assert_eq!(
            compute_risk_level(&[alarm(Severity::Medium)]),
            RiskLevel::Medium
        );
    }

    #[test]
    fn test_info_pile_stays_low() {
        // 6 x INFO = 6 scores MEDIUM, but the cap keeps it LOW.
        let alarms: Vec<Alarm> = (0..6).map(|_| alarm(Severity::Info)).collect();
        assert_eq!(compute_risk_level(&alarms), RiskLevel::Low);
    }

    #[test]
    fn test_two_highs_score_high() {
        // 2 x 10 = 20: score says HIGH, cap says HIGH. They agree.
        let alarms = vec![alarm(Severity::High), alarm(Severity::High)];
        assert_eq!(compute_risk_level(&alarms), RiskLevel::High);
    }

    #[test]
    fn test_critical_plus_highs_is_critical() {
        let alarms = vec![alarm(Severity::Critical), alarm(Severity::High)];
        assert_eq!(compute_risk_level(&alarms), RiskLevel::Critical);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"high\"");
    }
}
