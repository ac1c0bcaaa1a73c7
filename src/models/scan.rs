use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AnalysisPath, Category, ScanType, Severity};

/// Normalized triage result. Both analysis paths produce this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub result: Category,
    pub confidence: u8,
    pub notes: String,
    pub recommendations: Vec<String>,
    pub findings: Vec<String>,
    pub needs_hospital: bool,
    pub severity: Severity,
}

impl ScanOutcome {
    /// Severity and `needs_hospital` are derived from the category so the two
    /// can never disagree.
    pub fn new(
        result: Category,
        confidence: u8,
        notes: impl Into<String>,
        recommendations: Vec<String>,
        findings: Vec<String>,
    ) -> Self {
        let severity = result.severity();
        Self {
            result,
            confidence: confidence.min(100),
            notes: notes.into(),
            recommendations,
            findings,
            needs_hospital: severity == Severity::High,
            severity,
        }
    }

    /// Low-confidence "cannot assess" result.
    pub fn inconclusive(notes: impl Into<String>, recommendations: Vec<String>) -> Self {
        Self::new(Category::Inconclusive, 0, notes, recommendations, Vec::new())
    }
}

/// Persisted snapshot of one analysis. Only `deleted_at` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub scan_type: ScanType,
    #[serde(flatten)]
    pub outcome: ScanOutcome,
    pub image_ref: String,
    pub analysis_path: AnalysisPath,
    pub created_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl ScanRecord {
    pub fn new(
        owner_id: &str,
        scan_type: ScanType,
        outcome: ScanOutcome,
        image_ref: &str,
        analysis_path: AnalysisPath,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            scan_type,
            outcome,
            image_ref: image_ref.to_string(),
            analysis_path,
            created_at: now_seconds(),
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Current UTC time truncated to whole seconds, matching the stored format.
pub fn now_seconds() -> NaiveDateTime {
    let now = chrono::Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
