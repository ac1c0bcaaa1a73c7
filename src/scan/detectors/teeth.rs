//! Teeth detectors: whiteness/hygiene, dark cavity spots, gum inflammation.

use image::RgbImage;

use super::{ratio, Detector, DetectorError};
use crate::models::{DetectorKind, RiskTier};
use crate::scan::sampler::{sample, Region};
use crate::scan::signal::DetectorSignal;

const TEETH_REGION: Region = Region::new(0.25, 0.35, 0.75, 0.65);
const UPPER_GUM_REGION: Region = Region::new(0.25, 0.30, 0.75, 0.40);
const LOWER_GUM_REGION: Region = Region::new(0.25, 0.60, 0.75, 0.70);

// ── Hygiene ───────────────────────────────────────────────

/// Additive whiteness score with penalties for yellow stain and dark spots.
pub struct HygieneDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Risk {
    Low,
    Moderate,
    High,
}

impl Risk {
    fn as_str(self) -> &'static str {
        match self {
            Risk::Low => "Low",
            Risk::Moderate => "Moderate",
            Risk::High => "High",
        }
    }
}

impl Detector for HygieneDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::TeethHygiene
    }

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
        let mut white = 0u64;
        let mut yellow = 0u64;
        let mut dark = 0u64;
        let mut brightness_sum: f64 = 0.0;

        let total = sample(image, TEETH_REGION, |_, _, px| {
            let brightness = px.brightness();
            brightness_sum += brightness;
            if brightness > 180.0 && (px.r - px.g).abs() < 20.0 && (px.g - px.b).abs() < 20.0 {
                white += 1;
            }
            let yellowness = (px.r + px.g) / 2.0 - px.b;
            if yellowness > 30.0 && brightness > 100.0 {
                yellow += 1;
            }
            if brightness < 100.0 {
                dark += 1;
            }
        });

        if total == 0 {
            return Ok(DetectorSignal::unknown(self.kind(), "Unknown"));
        }

        let avg_brightness = brightness_sum / total as f64;
        let white_pct = ratio(white, total) * 100.0;
        let yellow_pct = ratio(yellow, total) * 100.0;
        let dark_pct = ratio(dark, total) * 100.0;

        let mut score: f64 = 0.0;
        let mut label = "Good";
        let mut plaque = Risk::Low;
        let mut cavity = Risk::Low;

        if avg_brightness > 180.0 {
            score += 30.0;
        } else if avg_brightness > 140.0 {
            score += 15.0;
        } else {
            score -= 10.0;
            label = "Poor";
        }

        if white_pct > 50.0 {
            score += 40.0;
        } else if white_pct > 30.0 {
            score += 20.0;
        } else {
            label = "Poor";
        }

        if yellow_pct > 40.0 {
            score -= 30.0;
            label = "Stained / Yellow";
            plaque = Risk::High;
        } else if yellow_pct > 20.0 {
            score -= 15.0;
            if label == "Good" {
                label = "Moderate Staining";
            }
            plaque = Risk::Moderate;
        }

        if dark_pct > 25.0 {
            score -= 40.0;
            label = "Severe Issues Detected";
            cavity = Risk::High;
        } else if dark_pct > 10.0 {
            score -= 20.0;
            cavity = Risk::Moderate;
        }

        let score = score.clamp(0.0, 100.0);

        // Re-examine the label against the combined picture.
        if score > 70.0 && yellow_pct < 20.0 && dark_pct < 10.0 {
            label = "Excellent";
        } else if score > 50.0 && cavity == Risk::Low {
            label = "Good";
        } else if cavity == Risk::High || dark_pct > 25.0 {
            label = "Urgent - Possible Cavities";
        } else if plaque == Risk::High {
            label = "Needs Professional Cleaning";
        }

        let tier = if dark_pct > 25.0 || score < 30.0 {
            RiskTier::High
        } else if score < 60.0 {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        };

        Ok(DetectorSignal::new(self.kind(), score, label, tier)
            .with_detail("plaqueRisk", plaque.as_str())
            .with_detail("cavityRisk", cavity.as_str())
            .with_detail("avgBrightness", format!("{avg_brightness:.2}"))
            .with_detail("whitenessPercentage", format!("{white_pct:.2}"))
            .with_detail("yellowTintPercentage", format!("{yellow_pct:.2}"))
            .with_detail("darkSpotPercentage", format!("{dark_pct:.2}")))
    }
}

// ── Cavity ────────────────────────────────────────────────

/// Very dark and brownish spots on the tooth surface.
pub struct CavityDetector;

impl Detector for CavityDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Cavity
    }

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
        let mut dark = 0u64;
        let mut brown = 0u64;

        let total = sample(image, TEETH_REGION, |_, _, px| {
            let brightness = px.brightness();
            if brightness < 60.0 {
                dark += 1;
            }
            if px.r > 80.0
                && px.r < 140.0
                && px.g > 60.0
                && px.g < 120.0
                && px.b < 80.0
                && brightness < 120.0
            {
                brown += 1;
            }
        });

        if total == 0 {
            return Ok(DetectorSignal::unknown(self.kind(), "Unknown"));
        }

        let dark_ratio = ratio(dark, total);
        let brown_ratio = ratio(brown, total);
        let score = ((dark_ratio + brown_ratio) * 200.0).round().min(100.0);

        let (label, tier) = if dark_ratio > 0.15 || brown_ratio > 0.20 {
            ("High Cavity Risk", RiskTier::High)
        } else if dark_ratio > 0.05 || brown_ratio > 0.10 {
            ("Moderate Cavity Risk", RiskTier::Moderate)
        } else {
            ("Low Cavity Risk", RiskTier::Low)
        };

        Ok(DetectorSignal::new(self.kind(), score, label, tier)
            .with_ratio("darkSpotRatio", dark_ratio)
            .with_ratio("brownRatio", brown_ratio))
    }
}

// ── Gum inflammation ──────────────────────────────────────

/// Pink versus strongly red tissue in the bands above and below the teeth.
pub struct GumInflammationDetector;

impl Detector for GumInflammationDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::GumInflammation
    }

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
        let mut pink = 0u64;
        let mut red = 0u64;
        let mut total = 0u64;

        for region in [UPPER_GUM_REGION, LOWER_GUM_REGION] {
            total += sample(image, region, |_, _, px| {
                if px.r > 150.0
                    && px.r < 220.0
                    && px.g > 120.0
                    && px.g < 180.0
                    && px.b > 120.0
                    && px.b < 180.0
                {
                    pink += 1;
                }
                if px.r > 140.0 && px.r > px.g * 1.3 && px.r > px.b * 1.3 {
                    red += 1;
                }
            });
        }

        if total == 0 {
            return Ok(DetectorSignal::unknown(self.kind(), "Unknown"));
        }

        let red_ratio = ratio(red, total);
        let pink_ratio = ratio(pink, total);

        let (score, label, tier) = if red_ratio > 0.30 {
            (80.0, "Severe Inflammation", RiskTier::High)
        } else if red_ratio > 0.15 {
            (50.0, "Moderate Inflammation", RiskTier::Moderate)
        } else if pink_ratio > 0.25 {
            (10.0, "Healthy", RiskTier::Low)
        } else {
            (20.0, "Unclear", RiskTier::Unknown)
        };

        Ok(DetectorSignal::new(self.kind(), score, label, tier)
            .with_ratio("redRatio", red_ratio)
            .with_ratio("pinkRatio", pink_ratio))
    }
}
