//! Coerce a backend's free-text reply into a [`ScanOutcome`].
//!
//! The reply should be one JSON object, but models wrap it in code fences,
//! use the legacy status vocabulary, or claim a severity that contradicts
//! their own category. Severity and `needsHospital` are always re-derived.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::AnalysisError;
use crate::models::{Category, ScanOutcome};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z]*[ \t]*\r?\n?|\r?\n?```").unwrap());

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportedAnalysis {
    #[serde(alias = "status")]
    result: String,
    #[serde(default, alias = "healthScore", alias = "score")]
    confidence: Option<Value>,
    #[serde(default, alias = "summary")]
    notes: Option<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    findings: Vec<String>,
}

pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Parse a backend reply. Fails with `ResponseParse` carrying the raw text.
pub fn parse_backend_reply(raw: &str) -> Result<ScanOutcome, AnalysisError> {
    let cleaned = strip_code_fences(raw);
    let reported: ReportedAnalysis =
        serde_json::from_str(&cleaned).map_err(|e| AnalysisError::ResponseParse {
            reason: e.to_string(),
            raw: raw.to_string(),
        })?;

    let category = Category::from_reported(&reported.result).ok_or_else(|| {
        AnalysisError::ResponseParse {
            reason: format!("unknown result '{}'", reported.result),
            raw: raw.to_string(),
        }
    })?;

    let confidence = reported
        .confidence
        .as_ref()
        .and_then(number)
        .map(clamp_confidence)
        .unwrap_or(0);

    let notes = reported
        .notes
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| reported.findings.join(". "));

    Ok(ScanOutcome::new(
        category,
        confidence,
        notes,
        reported.recommendations,
        reported.findings,
    ))
}

/// Parse, or fall back to an `Inconclusive` outcome whose notes are the raw
/// reply.
pub fn normalize_backend_reply(raw: &str) -> ScanOutcome {
    match parse_backend_reply(raw) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(error = %err, "Backend reply unusable, reporting inconclusive");
            ScanOutcome::inconclusive(raw.trim(), Vec::new())
        }
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn clamp_confidence(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
