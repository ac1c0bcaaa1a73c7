//! Skin detectors: tone/inflammation, mole pigmentation, texture/acne.

use image::RgbImage;

use super::{ratio, Detector, DetectorError};
use crate::models::{DetectorKind, RiskTier};
use crate::scan::sampler::{sample, variance, Region};
use crate::scan::signal::DetectorSignal;

const SKIN_REGION: Region = Region::new(0.20, 0.20, 0.80, 0.80);

// ── Tone / inflammation ───────────────────────────────────

/// Redness, dark spots and brightness uniformity, summed into one score.
pub struct SkinToneDetector;

impl Detector for SkinToneDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::SkinTone
    }

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
        let mut red = 0u64;
        let mut normal = 0u64;
        let mut dark = 0u64;
        let mut red_dominance_sum: f64 = 0.0;
        let mut brightness = Vec::new();

        let total = sample(image, SKIN_REGION, |_, _, px| {
            let br = px.brightness();
            brightness.push(br);
            let dominance = px.red_dominance();
            red_dominance_sum += dominance;

            if dominance > 30.0 && px.r > 120.0 {
                red += 1;
            }
            if br > 120.0
                && br < 200.0
                && px.r > px.g * 0.9
                && px.r < px.g * 1.3
                && px.g > px.b * 0.9
                && px.g < px.b * 1.2
            {
                normal += 1;
            }
            if br < 80.0 {
                dark += 1;
            }
        });

        if total == 0 {
            return Ok(DetectorSignal::unknown(self.kind(), "Unknown"));
        }

        let avg_redness = red_dominance_sum / total as f64;
        let uniformity = 100.0 - (variance(&brightness) / 5.0).min(100.0);
        let red_ratio = ratio(red, total);
        let normal_ratio = ratio(normal, total);
        let dark_ratio = ratio(dark, total);

        // Tier tracks redness only; dark spots and unevenness relabel.
        let mut score: f64 = 0.0;
        let mut label = "Healthy";
        let mut tier = RiskTier::Low;

        if red_ratio > 0.40 || avg_redness > 50.0 {
            score += 80.0;
            label = "Severe Inflammation/Rash";
            tier = RiskTier::High;
        } else if red_ratio > 0.20 || avg_redness > 30.0 {
            score += 50.0;
            label = "Moderate Redness";
            tier = RiskTier::Moderate;
        }

        if dark_ratio > 0.25 {
            score += 40.0;
            if label == "Healthy" {
                label = "Hyperpigmentation Detected";
            }
        } else if dark_ratio > 0.10 {
            score += 20.0;
        }

        if uniformity < 40.0 {
            score += 30.0;
            if label == "Healthy" {
                label = "Uneven Skin Texture";
            }
        } else if uniformity < 60.0 {
            score += 15.0;
        }

        if normal_ratio > 0.60 && red_ratio < 0.15 && uniformity > 60.0 {
            label = "Healthy Skin";
            score = score.min(20.0);
        }

        Ok(DetectorSignal::new(self.kind(), score.min(100.0), label, tier)
            .with_ratio("rednessRatio", red_ratio)
            .with_ratio("normalSkinRatio", normal_ratio)
            .with_ratio("darkSpotRatio", dark_ratio)
            .with_detail("uniformityScore", format!("{uniformity:.2}"))
            .with_detail("avgRedness", format!("{avg_redness:.2}")))
    }
}

// ── Mole / pigmentation ───────────────────────────────────

/// Very dark and brown patches. Near-black pixels weigh toward suspicion.
pub struct MoleDetector;

impl Detector for MoleDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Mole
    }

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
        let mut black = 0u64;
        let mut very_dark = 0u64;
        let mut brown = 0u64;

        let total = sample(image, SKIN_REGION, |_, _, px| {
            let br = px.brightness();
            if br < 50.0 {
                black += 1;
                very_dark += 1;
            } else if br < 100.0 {
                very_dark += 1;
            }
            if px.r > 60.0 && px.r < 130.0 && px.g > 40.0 && px.g < 100.0 && px.b < 80.0 {
                brown += 1;
            }
        });

        if total == 0 {
            return Ok(DetectorSignal::unknown(self.kind(), "Unknown"));
        }

        let dark_ratio = ratio(very_dark, total);
        let brown_ratio = ratio(brown, total);
        let black_ratio = ratio(black, total);
        let score = ((dark_ratio + brown_ratio) * 200.0).round().min(100.0);

        let count = if dark_ratio > 0.20 {
            "Multiple (5+)"
        } else if dark_ratio > 0.10 {
            "Several (2-4)"
        } else if dark_ratio > 0.03 {
            "Few (1-2)"
        } else {
            "None detected"
        };

        let tier = if black_ratio > 0.10 || dark_ratio > 0.25 {
            RiskTier::High
        } else if black_ratio > 0.03 || dark_ratio > 0.10 {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        };

        Ok(DetectorSignal::new(self.kind(), score, count, tier)
            .with_ratio("darkRatio", dark_ratio)
            .with_ratio("brownRatio", brown_ratio)
            .with_ratio("blackRatio", black_ratio))
    }
}

// ── Texture / acne ────────────────────────────────────────

/// Variance of brightness and of red dominance; bumpy, blotchy skin scores high.
pub struct TextureDetector;

impl Detector for TextureDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::SkinTexture
    }

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
        let mut brightness = Vec::new();
        let mut redness = Vec::new();

        sample(image, SKIN_REGION, |_, _, px| {
            brightness.push(px.brightness());
            redness.push(px.red_dominance());
        });

        if brightness.is_empty() {
            return Ok(DetectorSignal::unknown(self.kind(), "Unknown"));
        }

        let brightness_variance = variance(&brightness);
        let red_variance = variance(&redness);
        let texture_score = (brightness_variance / 10.0 + red_variance / 5.0).min(100.0);

        let (label, tier) = if texture_score > 70.0 || red_variance > 400.0 {
            ("Very Rough / Severe Acne", RiskTier::High)
        } else if texture_score > 45.0 || red_variance > 200.0 {
            ("Moderate Acne / Bumpy", RiskTier::Moderate)
        } else if texture_score > 25.0 || red_variance > 100.0 {
            ("Mild Roughness", RiskTier::Low)
        } else {
            ("Smooth", RiskTier::Low)
        };

        Ok(DetectorSignal::new(self.kind(), texture_score, label, tier)
            .with_detail("brightnessVariance", format!("{brightness_variance:.2}"))
            .with_detail("redVariance", format!("{red_variance:.2}")))
    }
}
