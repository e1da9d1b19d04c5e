use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::risk::{estimate_input, ComponentScores, LifestyleInput, RiskLevel};

static RISK_SCORE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Risk Score:\s+([0-9]+)").expect("valid risk score regex"));

static RISK_LEVEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Risk Level:\s*\(?(Low|Moderate|High)\b").expect("valid risk level regex")
});

/// Score declared by the model, or `None` when the reply has no
/// well-formed `Risk Score:` label. The label match is case-sensitive and
/// only ASCII digits count. Values past `u32::MAX` saturate.
pub fn parse_score(model_text: &str) -> Option<u32> {
    let digits = RISK_SCORE_PATTERN.captures(model_text)?.get(1)?.as_str();
    // The capture is non-empty ASCII digits, so overflow is the only failure.
    Some(digits.parse().unwrap_or(u32::MAX))
}

/// Best-effort score extraction. Unparseable replies read as 0.
pub fn extract_score(model_text: &str) -> u32 {
    parse_score(model_text).unwrap_or(0)
}

pub fn extract_level(model_text: &str) -> Option<RiskLevel> {
    let caps = RISK_LEVEL_PATTERN.captures(model_text)?;
    match caps.get(1)?.as_str() {
        "Low" => Some(RiskLevel::Low),
        "Moderate" => Some(RiskLevel::Moderate),
        "High" => Some(RiskLevel::High),
        _ => None,
    }
}

/// Result of one analysis. The local breakdown and the model's declared
/// score are independent and never reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub total_score: i32,
    pub level: RiskLevel,
    pub component_scores: ComponentScores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_level: Option<RiskLevel>,
}

impl RiskAssessment {
    /// Local-only assessment, no model involved.
    pub fn local(input: &LifestyleInput) -> Self {
        let (component_scores, total_score) = estimate_input(input);
        Self {
            total_score,
            level: RiskLevel::from_score(total_score),
            component_scores,
            narrative_text: None,
            model_score: None,
            model_level: None,
        }
    }

    /// Attach the model's narrative and whatever score/level it declared.
    pub fn with_narrative(mut self, narrative: impl Into<String>) -> Self {
        let narrative = narrative.into();
        self.model_score = parse_score(&narrative);
        self.model_level = extract_level(&narrative);
        self.narrative_text = Some(narrative);
        self
    }
}
