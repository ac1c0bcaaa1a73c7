use super::{no_advisory, DomainRules};
use crate::models::{Category, DetectorKind, RiskTier, ScanType};

pub static RULES: DomainRules = DomainRules {
    scan_type: ScanType::Skin,
    issues: &[
        (DetectorKind::Mole, RiskTier::High, "Suspicious Lesion (Irregular border/color)"),
        (DetectorKind::Mole, RiskTier::Moderate, "Skin Spots / Pigmentation"),
        (DetectorKind::SkinTone, RiskTier::High, "Severe Skin Infection/Inflammation"),
        (DetectorKind::SkinTone, RiskTier::Moderate, "Uneven Skin Tone / Redness"),
        (DetectorKind::SkinTexture, RiskTier::High, "Severe Inflammatory Acne (Cysts/Nodules)"),
        (DetectorKind::SkinTexture, RiskTier::Moderate, "Moderate Acne"),
    ],
    lead_actions: &[
        (Category::Urgent, DetectorKind::Mole, "Photograph the spot so a dermatologist can compare changes"),
        (Category::Urgent, DetectorKind::SkinTone, "Seek care promptly if the area is hot, swollen or spreading"),
        (Category::Urgent, DetectorKind::SkinTexture, "Ask a dermatologist about prescription acne treatment"),
        (Category::Concern, DetectorKind::Mole, "Check spots monthly for changes in size, shape or color"),
        (Category::Concern, DetectorKind::SkinTone, "Switch to gentle, fragrance-free products"),
        (Category::Concern, DetectorKind::SkinTexture, "Cleanse twice daily with a mild cleanser"),
    ],
    urgent: &[
        "⚠️ Consult a dermatologist immediately",
        "Monitor for rapid changes (size/color)",
        "Avoid touching or squeezing areas",
    ],
    concern: &[
        "Maintain a consistent skincare routine",
        "Use non-comedogenic products",
        "Stay hydrated and monitor diet",
    ],
    healthy: &[
        "Continue your good skincare habits",
        "Use sunscreen daily (SPF 30+)",
        "Stay hydrated",
    ],
    healthy_note: "Skin appears healthy. No visible lesions or inflammation.",
    healthy_finding: "No visible lesions, inflammation or acne",
    disclaimer: "Disclaimer: Not a medical diagnosis.",
    advisory: no_advisory,
};
