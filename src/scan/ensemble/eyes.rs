use super::{no_advisory, DomainRules};
use crate::models::{Category, DetectorKind, RiskTier, ScanType};

pub static RULES: DomainRules = DomainRules {
    scan_type: ScanType::Eyes,
    issues: &[
        (DetectorKind::EyeRedness, RiskTier::High, "Severe Eye Redness (Infection risk)"),
        (DetectorKind::EyeRedness, RiskTier::Moderate, "Mild-Moderate Eye Redness"),
        (DetectorKind::LensCloudiness, RiskTier::High, "Pupil Abnormality / Clouding"),
        (DetectorKind::LensCloudiness, RiskTier::Moderate, "Mild Haze / Cloudiness"),
        (DetectorKind::EyeFatigue, RiskTier::Moderate, "Eye Strain / Fatigue Indicators"),
    ],
    lead_actions: &[
        (Category::Urgent, DetectorKind::EyeRedness, "Have the redness checked for infection such as conjunctivitis"),
        (Category::Urgent, DetectorKind::LensCloudiness, "Book an eye exam to rule out cataract or lens damage"),
        (Category::Concern, DetectorKind::EyeRedness, "Avoid contact lenses and irritants until the redness settles"),
        (Category::Concern, DetectorKind::LensCloudiness, "Mention the haze at your next eye exam"),
        (Category::Concern, DetectorKind::EyeFatigue, "Take regular screen breaks and limit late-night screen use"),
    ],
    urgent: &[
        "⚠️ Seek medical attention immediately",
        "Do not rub eyes or use unprescribed drops",
        "Check for vision changes",
    ],
    concern: &[
        "Rest your eyes (20-20-20 rule)",
        "Use lubricating eye drops if dry",
        "Ensure adequate sleep and hydration",
    ],
    healthy: &[
        "Maintain good eye hygiene",
        "Wear UV-protective sunglasses",
        "Schedule regular eye exams",
    ],
    healthy_note: "Eyes appear healthy. Clear white of eyes, no visible inflammation.",
    healthy_finding: "No visible eye redness, clouding or strain",
    disclaimer: "Disclaimer: Not a medical diagnosis. Visual analysis only.",
    advisory: no_advisory,
};
