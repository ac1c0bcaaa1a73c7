//! Domain ensemble: three detector signals in, one triage outcome out.
//!
//! Evaluation order (first match wins):
//! 1. All three detectors errored: `Inconclusive`, confidence 0
//! 2. Any detector `High`: `Urgent`, notes name every `High` issue
//! 3. Any detector `Moderate`: `Concern`
//! 4. Otherwise `Healthy`
//!
//! Confidence is the maximum detector score, never an average. The first
//! maximal signal of the deciding tier picks the lead recommendation.

pub mod eyes;
pub mod skin;
pub mod teeth;

use crate::models::{Category, DetectorKind, RiskTier, ScanOutcome, ScanType};
use crate::scan::signal::DetectorSignal;

pub const RETAKE_RECOMMENDATION: &str =
    "Retake the photo in good, even lighting with the area centered and in focus";

/// Per-domain lookup tables consulted by [`classify`].
pub struct DomainRules {
    pub scan_type: ScanType,
    /// Human-readable issue per (detector, tier).
    pub issues: &'static [(DetectorKind, RiskTier, &'static str)],
    /// Detector-specific action placed ahead of the category list.
    pub lead_actions: &'static [(Category, DetectorKind, &'static str)],
    pub urgent: &'static [&'static str],
    pub concern: &'static [&'static str],
    pub healthy: &'static [&'static str],
    pub healthy_note: &'static str,
    pub healthy_finding: &'static str,
    pub disclaimer: &'static str,
    /// Extra advisory sentence derived from the raw signals.
    pub advisory: fn(&[DetectorSignal; 3]) -> Option<&'static str>,
}

impl DomainRules {
    fn issue(&self, signal: &DetectorSignal) -> String {
        self.issues
            .iter()
            .find(|(kind, tier, _)| *kind == signal.detector && *tier == signal.risk_tier)
            .map(|(_, _, text)| text.to_string())
            .unwrap_or_else(|| signal.label.clone())
    }

    fn recommendations(&self, category: Category, lead: Option<DetectorKind>) -> Vec<String> {
        let base: &[&str] = match category {
            Category::Urgent => self.urgent,
            Category::Concern => self.concern,
            Category::Healthy => self.healthy,
            Category::Inconclusive => &[RETAKE_RECOMMENDATION],
        };

        let lead_action = lead.and_then(|kind| {
            self.lead_actions
                .iter()
                .find(|(cat, k, _)| *cat == category && *k == kind)
                .map(|(_, _, text)| *text)
        });

        lead_action
            .into_iter()
            .chain(base.iter().copied())
            .chain(std::iter::once(self.disclaimer))
            .map(str::to_string)
            .collect()
    }
}

pub fn no_advisory(_signals: &[DetectorSignal; 3]) -> Option<&'static str> {
    None
}

/// Rule tables for a domain.
pub fn rules_for(scan_type: ScanType) -> &'static DomainRules {
    match scan_type {
        ScanType::Eyes => &eyes::RULES,
        ScanType::Teeth => &teeth::RULES,
        ScanType::Skin => &skin::RULES,
    }
}

/// Combine a domain's three signals into one outcome.
pub fn classify(rules: &DomainRules, signals: &[DetectorSignal; 3]) -> ScanOutcome {
    let errored = signals.iter().filter(|s| s.is_error()).count();
    if errored == signals.len() {
        return ScanOutcome::new(
            Category::Inconclusive,
            0,
            "Could not assess this photo: none of the checks could run.",
            rules.recommendations(Category::Inconclusive, None),
            Vec::new(),
        );
    }

    let at_tier = |tier: RiskTier| {
        signals
            .iter()
            .filter(move |s| s.risk_tier == tier)
            .collect::<Vec<_>>()
    };
    let high = at_tier(RiskTier::High);
    let moderate = at_tier(RiskTier::Moderate);

    let (category, contributing) = if !high.is_empty() {
        (Category::Urgent, high)
    } else if !moderate.is_empty() {
        (Category::Concern, moderate)
    } else {
        (Category::Healthy, Vec::new())
    };

    let confidence = first_max(signals.iter()).map(|s| s.score).unwrap_or(0);
    let lead = first_max(contributing.iter().copied()).map(|s| s.detector);

    let findings: Vec<String> = if contributing.is_empty() {
        vec![rules.healthy_finding.to_string()]
    } else {
        contributing.iter().map(|s| rules.issue(s)).collect()
    };

    let mut notes = if contributing.is_empty() {
        rules.healthy_note.to_string()
    } else {
        format!("Detected: {}.", findings.join(", "))
    };
    if let Some(advisory) = (rules.advisory)(signals) {
        notes.push(' ');
        notes.push_str(advisory);
    }
    if errored > 0 {
        notes.push_str(&format!(" {errored} of {} checks could not run.", signals.len()));
    }

    tracing::debug!(
        scan_type = %rules.scan_type,
        category = %category,
        confidence,
        lead = ?lead,
        "Ensemble classified"
    );

    ScanOutcome::new(
        category,
        confidence,
        notes,
        rules.recommendations(category, lead),
        findings,
    )
}

/// First signal carrying the highest score.
fn first_max<'a>(signals: impl Iterator<Item = &'a DetectorSignal>) -> Option<&'a DetectorSignal> {
    signals.fold(None, |best: Option<&DetectorSignal>, s| match best {
        Some(b) if b.score >= s.score => Some(b),
        _ => Some(s),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn signal(kind: DetectorKind, score: f64, tier: RiskTier) -> DetectorSignal {
        DetectorSignal::new(kind, score, "label", tier)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::signal;
    use super::*;
    use crate::models::Severity;

    fn eye_signals(
        redness: (f64, RiskTier),
        lens: (f64, RiskTier),
        fatigue: (f64, RiskTier),
    ) -> [DetectorSignal; 3] {
        [
            signal(DetectorKind::EyeRedness, redness.0, redness.1),
            signal(DetectorKind::LensCloudiness, lens.0, lens.1),
            signal(DetectorKind::EyeFatigue, fatigue.0, fatigue.1),
        ]
    }

    #[test]
    fn all_errors_are_inconclusive() {
        let signals = [
            DetectorSignal::error(DetectorKind::EyeRedness, "a"),
            DetectorSignal::error(DetectorKind::LensCloudiness, "b"),
            DetectorSignal::error(DetectorKind::EyeFatigue, "c"),
        ];
        let outcome = classify(&eyes::RULES, &signals);
        assert_eq!(outcome.result, Category::Inconclusive);
        assert_eq!(outcome.confidence, 0);
        assert_eq!(outcome.recommendations[0], RETAKE_RECOMMENDATION);
        assert!(!outcome.needs_hospital);
    }

    #[test]
    fn two_high_signals_name_both_issues() {
        let signals = eye_signals(
            (64.0, RiskTier::High),
            (80.0, RiskTier::High),
            (10.0, RiskTier::Low),
        );
        let outcome = classify(&eyes::RULES, &signals);
        assert_eq!(outcome.result, Category::Urgent);
        assert!(outcome.needs_hospital);
        assert_eq!(outcome.severity, Severity::High);
        assert_eq!(
            outcome.notes,
            "Detected: Severe Eye Redness (Infection risk), Pupil Abnormality / Clouding."
        );
        assert_eq!(outcome.findings.len(), 2);
        assert_eq!(outcome.confidence, 80);
    }

    #[test]
    fn single_high_wins_over_moderates() {
        let signals = eye_signals(
            (40.0, RiskTier::Moderate),
            (60.0, RiskTier::High),
            (90.0, RiskTier::Moderate),
        );
        let outcome = classify(&eyes::RULES, &signals);
        assert_eq!(outcome.result, Category::Urgent);
        assert_eq!(outcome.findings, vec!["Pupil Abnormality / Clouding".to_string()]);
        // Confidence is the max over all three, not just the deciding tier.
        assert_eq!(outcome.confidence, 90);
    }

    #[test]
    fn moderate_is_concern() {
        let signals = eye_signals(
            (40.0, RiskTier::Moderate),
            (0.0, RiskTier::Low),
            (20.0, RiskTier::Low),
        );
        let outcome = classify(&eyes::RULES, &signals);
        assert_eq!(outcome.result, Category::Concern);
        assert_eq!(outcome.severity, Severity::Moderate);
        assert!(!outcome.needs_hospital);
        assert_eq!(outcome.notes, "Detected: Mild-Moderate Eye Redness.");
    }

    #[test]
    fn all_low_is_healthy() {
        let signals = eye_signals(
            (5.0, RiskTier::Low),
            (0.0, RiskTier::Low),
            (12.0, RiskTier::Low),
        );
        let outcome = classify(&eyes::RULES, &signals);
        assert_eq!(outcome.result, Category::Healthy);
        assert_eq!(outcome.confidence, 12);
        assert_eq!(outcome.notes, eyes::RULES.healthy_note);
        assert_eq!(outcome.recommendations.last().unwrap(), eyes::RULES.disclaimer);
    }

    #[test]
    fn unknown_signals_do_not_raise_category() {
        let signals = eye_signals(
            (0.0, RiskTier::Unknown),
            (0.0, RiskTier::Low),
            (0.0, RiskTier::Low),
        );
        assert_eq!(classify(&eyes::RULES, &signals).result, Category::Healthy);
    }

    #[test]
    fn partial_errors_are_noted_and_others_still_count() {
        let signals = [
            DetectorSignal::error(DetectorKind::EyeRedness, "boom"),
            signal(DetectorKind::LensCloudiness, 70.0, RiskTier::High),
            DetectorSignal::error(DetectorKind::EyeFatigue, "boom"),
        ];
        let outcome = classify(&eyes::RULES, &signals);
        assert_eq!(outcome.result, Category::Urgent);
        assert!(outcome.notes.ends_with("2 of 3 checks could not run."));
    }

    #[test]
    fn lead_recommendation_follows_top_scoring_trigger() {
        let signals = eye_signals(
            (64.0, RiskTier::High),
            (90.0, RiskTier::High),
            (0.0, RiskTier::Low),
        );
        let outcome = classify(&eyes::RULES, &signals);
        let lead = eyes::RULES
            .lead_actions
            .iter()
            .find(|(c, k, _)| *c == Category::Urgent && *k == DetectorKind::LensCloudiness)
            .map(|(_, _, t)| t.to_string())
            .unwrap();
        assert_eq!(outcome.recommendations[0], lead);
    }

    #[test]
    fn first_max_keeps_earliest_on_tie() {
        let signals = eye_signals(
            (50.0, RiskTier::High),
            (50.0, RiskTier::High),
            (0.0, RiskTier::Low),
        );
        let first = first_max(signals.iter()).unwrap();
        assert_eq!(first.detector, DetectorKind::EyeRedness);
    }

    #[test]
    fn every_domain_ends_recommendations_with_disclaimer() {
        for scan_type in [ScanType::Eyes, ScanType::Teeth, ScanType::Skin] {
            let rules = rules_for(scan_type);
            for category in [Category::Urgent, Category::Concern, Category::Healthy, Category::Inconclusive] {
                let recs = rules.recommendations(category, None);
                assert_eq!(recs.last().map(String::as_str), Some(rules.disclaimer));
                assert!(recs.len() >= 2);
            }
        }
    }
}
