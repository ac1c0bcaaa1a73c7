use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{DetectorKind, RiskTier};

/// Output of one detector: a bounded score, a label, a risk tier and the
/// intermediate ratios that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorSignal {
    pub detector: DetectorKind,
    pub score: u8,
    pub label: String,
    pub risk_tier: RiskTier,
    pub details: BTreeMap<String, String>,
}

impl DetectorSignal {
    pub fn new(detector: DetectorKind, score: f64, label: &str, risk_tier: RiskTier) -> Self {
        Self {
            detector,
            score: clamp_score(score),
            label: label.to_string(),
            risk_tier,
            details: BTreeMap::new(),
        }
    }

    /// Nothing was sampled, so nothing can be said.
    pub fn unknown(detector: DetectorKind, label: &str) -> Self {
        Self::new(detector, 0.0, label, RiskTier::Unknown)
    }

    /// Degraded signal for a detector that failed internally.
    pub fn error(detector: DetectorKind, reason: &str) -> Self {
        Self::new(detector, 0.0, "Error", RiskTier::Error).with_detail("error", reason)
    }

    pub fn with_detail(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }

    /// Ratio details are reported to four decimals.
    pub fn with_ratio(self, key: &str, ratio: f64) -> Self {
        self.with_detail(key, format!("{ratio:.4}"))
    }

    pub fn is_error(&self) -> bool {
        self.risk_tier == RiskTier::Error
    }
}

fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}
