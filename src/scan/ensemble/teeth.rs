use super::DomainRules;
use crate::models::{Category, DetectorKind, RiskTier, ScanType};
use crate::scan::signal::DetectorSignal;

pub static RULES: DomainRules = DomainRules {
    scan_type: ScanType::Teeth,
    issues: &[
        (DetectorKind::Cavity, RiskTier::High, "Severe Tooth Decay / Advanced Cavities"),
        (DetectorKind::Cavity, RiskTier::Moderate, "Early Cavities / Enamel Damage"),
        (DetectorKind::GumInflammation, RiskTier::High, "Severe Gum Disease (Periodontitis Risk)"),
        (DetectorKind::GumInflammation, RiskTier::Moderate, "Mild Gum Inflammation (Gingivitis)"),
        (DetectorKind::TeethHygiene, RiskTier::High, "Severe Plaque/Tartar or Damaged Teeth"),
        (DetectorKind::TeethHygiene, RiskTier::Moderate, "Plaque and Tartar Buildup"),
    ],
    lead_actions: &[
        (Category::Urgent, DetectorKind::Cavity, "Avoid very hot, cold or sugary food on the affected side"),
        (Category::Urgent, DetectorKind::GumInflammation, "Rinse with warm salt water until you see a dentist"),
        (Category::Urgent, DetectorKind::TeethHygiene, "Book a professional cleaning"),
        (Category::Concern, DetectorKind::Cavity, "Use a fluoride toothpaste"),
        (Category::Concern, DetectorKind::GumInflammation, "Floss gently along the gum line every day"),
        (Category::Concern, DetectorKind::TeethHygiene, "Cut back on coffee, tea and tobacco"),
    ],
    urgent: &[
        "⚠️ Schedule immediate dental appointment",
        "Avoid hard foods",
        "Maintain gentle brushing",
    ],
    concern: &[
        "Get checkup within 2 weeks",
        "Brush twice daily",
        "Floss regularly",
    ],
    healthy: &[
        "Continue regular brushing",
        "Schedule checkup every 6 months",
    ],
    healthy_note: "Teeth and gums appear healthy. No visible cavities or inflammation.",
    healthy_finding: "No visible cavities, plaque or gum inflammation",
    disclaimer: "Disclaimer: Not a medical diagnosis. Visual analysis only.",
    advisory: shadow_advisory,
};

const SHADOW_NOTE: &str =
    "Dark Spots (Possible Shadows/Stains): teeth otherwise look clean, so retake in even light to confirm.";

/// High cavity risk next to otherwise clean enamel is often a lighting
/// shadow. The category stands; only the note changes.
fn shadow_advisory(signals: &[DetectorSignal; 3]) -> Option<&'static str> {
    let find = |kind: DetectorKind| signals.iter().find(|s| s.detector == kind);
    let cavity = find(DetectorKind::Cavity)?;
    let hygiene = find(DetectorKind::TeethHygiene)?;
    (cavity.risk_tier == RiskTier::High && hygiene.score > 50).then_some(SHADOW_NOTE)
}
