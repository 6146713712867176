//! Raw analysis payload → canonical [`SustainabilityReport`].
//!
//! Shape is decided by field presence, never by a version tag:
//! - Verdict when `finalDecision` or `materialComposition` is present
//! - Scored when `sustainabilityScore` or `materials` is present
//! - Verdict wins when both sets appear
//!
//! Every key is accepted in camelCase and in the snake_case the server
//! actually emits. A present discriminant with the wrong JSON type makes the
//! whole payload `Malformed`.

use crate::types::errors::ScanError;
use crate::types::report::{
    MaterialImpact, ScoredReport, SustainabilityReport, VerdictReport, SUSTAINABLE_TIP_COUNT,
};
use log::warn;
use serde_json::{Map, Value};

/// A normalized report plus the id the legacy server assigned to the scan.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAnalysis {
    pub report: SustainabilityReport,
    pub scan_id: Option<String>,
}

pub fn normalize(raw: &Value) -> Result<NormalizedAnalysis, ScanError> {
    let obj = raw.as_object().ok_or_else(|| {
        ScanError::Malformed(format!("expected a JSON object, got {}", kind(raw)))
    })?;

    // Legacy envelope: {"success": true, "scan_id": "...", "analysis": {...}}
    if let Some(inner) = field(obj, "analysis", "analysis").and_then(Value::as_object) {
        let scan_id = field(obj, "scanId", "scan_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        let report = normalize_report(inner)?;
        return Ok(NormalizedAnalysis { report, scan_id });
    }

    Ok(NormalizedAnalysis {
        report: normalize_report(obj)?,
        scan_id: None,
    })
}

/// Normalize a bare report object (no envelope).
pub fn normalize_report(obj: &Map<String, Value>) -> Result<SustainabilityReport, ScanError> {
    let verdict = has_any(
        obj,
        &[
            ("finalDecision", "final_decision"),
            ("materialComposition", "material_composition"),
        ],
    );
    let scored = has_any(
        obj,
        &[
            ("sustainabilityScore", "sustainability_score"),
            ("materials", "materials"),
        ],
    );

    match (verdict, scored) {
        (true, true) => {
            warn!("Analysis payload carries both report shapes; reading it as a verdict report");
            Ok(SustainabilityReport::Verdict(verdict_report(obj)?))
        }
        (true, false) => Ok(SustainabilityReport::Verdict(verdict_report(obj)?)),
        (false, true) => Ok(SustainabilityReport::Scored(scored_report(obj)?)),
        (false, false) => {
            // The server answers 200 with {"error", "raw_output"} when its own parse fails
            if let Some(error) = field(obj, "error", "error").and_then(Value::as_str) {
                return Err(ScanError::Malformed(format!("analysis service reported: {error}")));
            }
            let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            Err(ScanError::Malformed(format!(
                "payload matches no known report shape (keys: {})",
                keys.join(", ")
            )))
        }
    }
}

fn verdict_report(obj: &Map<String, Value>) -> Result<VerdictReport, ScanError> {
    let final_decision = match field(obj, "finalDecision", "final_decision") {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Some(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Some(false),
        Some(other) => {
            return Err(ScanError::Malformed(format!(
                "finalDecision must be a boolean, got {}",
                kind(other)
            )))
        }
    };

    let material_composition = match field(obj, "materialComposition", "material_composition") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| material_impact(idx, item))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(ScanError::Malformed(format!(
                "materialComposition must be an array, got {}",
                kind(other)
            )))
        }
    };

    let tips = match field(obj, "sustainableTips", "sustainable_tips") {
        None => Vec::new(),
        Some(value) => string_list(value, "sustainableTips")?,
    };

    Ok(VerdictReport {
        carbon_footprint: text(obj, "carbonFootprint", "carbon_footprint")?,
        material_composition,
        country_origin: text(obj, "countryOrigin", "country_origin")?,
        expected_durability: text(obj, "expectedDurability", "expected_durability")?,
        final_decision,
        sustainable_tips: fit_tips(tips),
        clothing_type: text(obj, "clothingType", "clothing_type")?,
    })
}

fn scored_report(obj: &Map<String, Value>) -> Result<ScoredReport, ScanError> {
    let sustainability_score = match field(obj, "sustainabilityScore", "sustainability_score") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(format!("{n}/10")),
        Some(other) => {
            return Err(ScanError::Malformed(format!(
                "sustainabilityScore must be a string, got {}",
                kind(other)
            )))
        }
    };

    let materials = match field(obj, "materials", "materials") {
        None => Vec::new(),
        Some(value) => string_list(value, "materials")?,
    };

    Ok(ScoredReport {
        sustainability_score,
        materials,
        longevity: text(obj, "longevity", "longevity")?,
        recyclability: text(obj, "recyclability", "recyclability")?,
        care_instructions: text(obj, "careInstructions", "care_instructions")?,
        environmental_impact: text(obj, "environmentalImpact", "environmental_impact")?,
    })
}

fn material_impact(idx: usize, item: &Value) -> Result<MaterialImpact, ScanError> {
    let obj = item.as_object().ok_or_else(|| {
        ScanError::Malformed(format!("materialComposition[{idx}] must be an object"))
    })?;
    let material_name = text(obj, "materialName", "material_name")?.ok_or_else(|| {
        ScanError::Malformed(format!("materialComposition[{idx}] has no materialName"))
    })?;
    let environmental_consequence =
        text(obj, "environmentalConsequence", "environmental_consequence")?.ok_or_else(|| {
            ScanError::Malformed(format!(
                "materialComposition[{idx}] has no environmentalConsequence"
            ))
        })?;
    Ok(MaterialImpact {
        material_name,
        environmental_consequence,
    })
}

/// Leniency policy: the tip list is forced to exactly three entries. Short
/// lists are padded with empty strings, long ones truncated. Both are logged
/// so the mismatch stays visible.
fn fit_tips(mut tips: Vec<String>) -> Vec<String> {
    if tips.len() != SUSTAINABLE_TIP_COUNT {
        warn!(
            "sustainableTips had {} entries, expected {}; {} to fit",
            tips.len(),
            SUSTAINABLE_TIP_COUNT,
            if tips.len() < SUSTAINABLE_TIP_COUNT {
                "padding"
            } else {
                "truncating"
            }
        );
    }
    tips.resize(SUSTAINABLE_TIP_COUNT, String::new());
    tips
}

/// Look up a key in either spelling. JSON `null` counts as absent.
fn field<'a>(obj: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    obj.get(camel)
        .or_else(|| obj.get(snake))
        .filter(|v| !v.is_null())
}

fn has_any(obj: &Map<String, Value>, keys: &[(&str, &str)]) -> bool {
    keys.iter()
        .any(|(camel, snake)| field(obj, camel, snake).is_some())
}

fn text(obj: &Map<String, Value>, camel: &str, snake: &str) -> Result<Option<String>, ScanError> {
    match field(obj, camel, snake) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(ScanError::Malformed(format!(
            "{camel} must be text, got {}",
            kind(other)
        ))),
    }
}

fn string_list(value: &Value, name: &str) -> Result<Vec<String>, ScanError> {
    let items = value.as_array().ok_or_else(|| {
        ScanError::Malformed(format!("{name} must be an array, got {}", kind(value)))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ScanError::Malformed(format!("{name} entries must be strings")))
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "tests/normalizer_tests.rs"]
mod tests;
