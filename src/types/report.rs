//! Canonical sustainability report.
//!
//! The analysis service has answered in two incompatible schemas over its
//! lifetime. Both are kept verbatim here as the two arms of one union; the
//! derived values (verdict, score band, clothing type) are computed from
//! whichever arm was received.

use serde::{Deserialize, Serialize};

/// Placeholder used wherever a report carries no clothing type.
pub const UNKNOWN_CLOTHING_TYPE: &str = "unknown";

/// Number of advisory tips a verdict report always exposes.
pub const SUSTAINABLE_TIP_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    /// High is 8 and above, Medium 5 to 7, Low below 5.
    pub fn from_score(score: u32) -> Self {
        if score >= 8 {
            ScoreBand::High
        } else if score >= 5 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }

    /// Accent colour the results screen uses for the score.
    pub fn color(self) -> &'static str {
        match self {
            ScoreBand::High => "#4CAF50",
            ScoreBand::Medium => "#FF9800",
            ScoreBand::Low => "#F44336",
        }
    }
}

/// The "scored" schema: a `N/10` score plus free-text assessments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoredReport {
    pub sustainability_score: Option<String>,
    pub materials: Vec<String>,
    pub longevity: Option<String>,
    pub recyclability: Option<String>,
    pub care_instructions: Option<String>,
    pub environmental_impact: Option<String>,
}

/// One entry of a verdict report's material breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MaterialImpact {
    pub material_name: String,
    pub environmental_consequence: String,
}

/// The "verdict" schema: material breakdown plus a yes/no decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VerdictReport {
    pub carbon_footprint: Option<String>,
    pub material_composition: Vec<MaterialImpact>,
    pub country_origin: Option<String>,
    pub expected_durability: Option<String>,
    pub final_decision: Option<bool>,
    /// Always exactly [`SUSTAINABLE_TIP_COUNT`] entries after normalization.
    pub sustainable_tips: Vec<String>,
    pub clothing_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum SustainabilityReport {
    Scored(ScoredReport),
    Verdict(VerdictReport),
}

impl SustainabilityReport {
    /// `Some(verdict)` only when the service gave an explicit decision.
    pub fn is_sustainable(&self) -> Option<bool> {
        match self {
            SustainabilityReport::Scored(_) => None,
            SustainabilityReport::Verdict(v) => v.final_decision,
        }
    }

    pub fn score(&self) -> Option<u32> {
        match self {
            SustainabilityReport::Scored(s) => {
                s.sustainability_score.as_deref().and_then(parse_score)
            }
            SustainabilityReport::Verdict(_) => None,
        }
    }

    pub fn score_band(&self) -> Option<ScoreBand> {
        self.score().map(ScoreBand::from_score)
    }

    pub fn clothing_type(&self) -> &str {
        match self {
            SustainabilityReport::Verdict(VerdictReport {
                clothing_type: Some(kind),
                ..
            }) if !kind.trim().is_empty() => kind.as_str(),
            _ => UNKNOWN_CLOTHING_TYPE,
        }
    }

    pub fn has_known_clothing_type(&self) -> bool {
        self.clothing_type() != UNKNOWN_CLOTHING_TYPE
    }

    pub fn verdict_message(&self) -> Option<&'static str> {
        self.is_sustainable().map(|sustainable| {
            if sustainable {
                "Your clothing item is environmentally sustainable"
            } else {
                "Your clothing item is not environmentally sustainable"
            }
        })
    }

    pub fn material_summary(&self) -> String {
        match self {
            SustainabilityReport::Scored(s) => s.materials.join(", "),
            SustainabilityReport::Verdict(v) => v
                .material_composition
                .iter()
                .map(|m| format!("{} - {}", m.material_name, m.environmental_consequence))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Leading integer of a `N/10` score. Anything else yields `None`.
pub fn parse_score(raw: &str) -> Option<u32> {
    let head = raw.split('/').next()?.trim();
    let digits: String = head.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(score: &str) -> SustainabilityReport {
        SustainabilityReport::Scored(ScoredReport {
            sustainability_score: Some(score.to_string()),
            materials: vec!["cotton".into(), "elastane".into()],
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("9/10"), Some(9));
        assert_eq!(parse_score(" 7 /10"), Some(7));
        assert_eq!(parse_score("8 - durable cotton"), Some(8));
        assert_eq!(parse_score("N/A"), None);
        assert_eq!(parse_score("about 6/10"), None);
    }

    #[test]
    fn test_score_band_boundaries() {
        assert_eq!(ScoreBand::from_score(8), ScoreBand::High);
        assert_eq!(ScoreBand::from_score(7), ScoreBand::Medium);
        assert_eq!(ScoreBand::from_score(5), ScoreBand::Medium);
        assert_eq!(ScoreBand::from_score(4), ScoreBand::Low);
        assert_eq!(ScoreBand::from_score(0), ScoreBand::Low);
    }

    #[test]
    fn test_scored_report_derivations() {
        let report = scored("9/10");
        assert_eq!(report.score_band(), Some(ScoreBand::High));
        assert_eq!(report.is_sustainable(), None);
        assert_eq!(report.clothing_type(), UNKNOWN_CLOTHING_TYPE);
        assert_eq!(report.material_summary(), "cotton, elastane");

        assert_eq!(scored("unrated").score_band(), None);
    }

    #[test]
    fn test_verdict_report_derivations() {
        let report = SustainabilityReport::Verdict(VerdictReport {
            final_decision: Some(false),
            clothing_type: Some("jacket".into()),
            material_composition: vec![MaterialImpact {
                material_name: "polyester".into(),
                environmental_consequence: "Sheds microplastics".into(),
            }],
            ..Default::default()
        });

        assert_eq!(report.is_sustainable(), Some(false));
        assert_eq!(report.score_band(), None);
        assert_eq!(report.clothing_type(), "jacket");
        assert_eq!(report.material_summary(), "polyester - Sheds microplastics");
        assert_eq!(
            report.verdict_message(),
            Some("Your clothing item is not environmentally sustainable")
        );
    }

    #[test]
    fn test_blank_clothing_type_falls_back_to_placeholder() {
        let report = SustainabilityReport::Verdict(VerdictReport {
            clothing_type: Some("  ".into()),
            ..Default::default()
        });
        assert!(!report.has_known_clothing_type());
    }

    #[test]
    fn test_canonical_form_is_tagged() {
        let json = serde_json::to_value(scored("6/10")).unwrap();
        assert_eq!(json["shape"], "scored");
        assert_eq!(json["sustainabilityScore"], "6/10");

        let back: SustainabilityReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, scored("6/10"));
    }
}
