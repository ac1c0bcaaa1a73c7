//! Eye detectors: scleral redness, central lens cloudiness, under-eye fatigue.

use image::RgbImage;

use super::{ratio, Detector, DetectorError};
use crate::models::{DetectorKind, RiskTier};
use crate::scan::sampler::{sample, Region};
use crate::scan::signal::DetectorSignal;

const REDNESS_REGION: Region = Region::new(0.25, 0.25, 0.75, 0.75);
const LENS_REGION: Region = Region::new(0.40, 0.40, 0.60, 0.60);
const UNDER_EYE_REGION: Region = Region::new(0.30, 0.50, 0.70, 0.70);

/// Minimum share of sampled pixels that must look like eye (sclera or red
/// vessel) before the redness ratio means anything.
const MIN_EYE_AREA: f64 = 0.05;

// ── Redness ───────────────────────────────────────────────

/// Ratio of red-dominant pixels within the visible sclera.
pub struct RednessDetector;

impl Detector for RednessDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::EyeRedness
    }

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
        let mut white = 0u64;
        let mut red = 0u64;

        let total = sample(image, REDNESS_REGION, |_, _, px| {
            if px.r > 150.0
                && px.g > 150.0
                && px.b > 150.0
                && (px.r - px.g).abs() < 30.0
                && (px.r - px.b).abs() < 30.0
            {
                white += 1;
            }
            if px.r > 100.0 && px.r > px.g * 1.4 && px.r > px.b * 1.4 {
                red += 1;
            }
        });

        if total == 0 {
            return Ok(DetectorSignal::unknown(self.kind(), "Unknown"));
        }

        let eye_area = white + red;
        if (eye_area as f64) < total as f64 * MIN_EYE_AREA {
            return Ok(DetectorSignal::unknown(self.kind(), "Unclear (Low Confidence)")
                .with_detail("redPixels", red)
                .with_detail("scleraPixels", white));
        }

        let redness = ratio(red, eye_area);
        let score = (redness * 400.0).round().min(100.0);

        let (label, tier) = if score > 60.0 {
            ("Severe Inflammation", RiskTier::High)
        } else if score > 30.0 {
            ("Irritated / Red", RiskTier::Moderate)
        } else if score > 15.0 {
            ("Mild Redness", RiskTier::Low)
        } else {
            ("Healthy", RiskTier::Low)
        };

        Ok(DetectorSignal::new(self.kind(), score, label, tier)
            .with_detail("redPixels", red)
            .with_detail("scleraPixels", white)
            .with_ratio("ratio", redness))
    }
}

// ── Lens cloudiness ───────────────────────────────────────

/// Bright, achromatic (gray-white) pixels at the pupil suggest clouding.
pub struct LensCloudinessDetector;

impl Detector for LensCloudinessDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::LensCloudiness
    }

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
        let mut cloudy = 0u64;
        let mut brightness_sum: f64 = 0.0;

        let total = sample(image, LENS_REGION, |_, _, px| {
            let brightness = px.brightness();
            brightness_sum += brightness;
            let is_gray = (px.r - px.g).abs() < 20.0 && (px.g - px.b).abs() < 20.0;
            if brightness > 100.0 && is_gray {
                cloudy += 1;
            }
        });

        if total == 0 {
            return Ok(DetectorSignal::unknown(self.kind(), "Unknown"));
        }

        let avg_brightness = brightness_sum / total as f64;
        let cloudiness = ratio(cloudy, total);

        // A dark pupil is clear whatever the gray ratio says.
        let (score, label, tier) = if avg_brightness < 60.0 {
            (0.0, "Clear Pupil", RiskTier::Low)
        } else {
            let score = (cloudiness * 200.0).round().min(100.0);
            if score > 50.0 {
                (score, "Cloudy / Hazy", RiskTier::High)
            } else if score > 20.0 {
                (score, "Mild Haze", RiskTier::Moderate)
            } else {
                (score, "Clear", RiskTier::Low)
            }
        };

        Ok(DetectorSignal::new(self.kind(), score, label, tier)
            .with_ratio("cloudinessRatio", cloudiness)
            .with_detail("avgCenterBrightness", format!("{avg_brightness:.2}")))
    }
}

// ── Fatigue ───────────────────────────────────────────────

/// Dark under-eye band. A strain indicator: never rises above `Moderate`.
pub struct FatigueDetector;

impl Detector for FatigueDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::EyeFatigue
    }

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
        let mut dark = 0u64;
        let mut brightness_sum: f64 = 0.0;

        let total = sample(image, UNDER_EYE_REGION, |_, _, px| {
            let brightness = px.brightness();
            brightness_sum += brightness;
            if brightness < 80.0 {
                dark += 1;
            }
        });

        if total == 0 {
            return Ok(DetectorSignal::unknown(self.kind(), "Unknown"));
        }

        let avg_brightness = brightness_sum / total as f64;
        let darkness = ratio(dark, total);
        let score = (darkness * 200.0).round().min(100.0);

        let (label, tier) = if avg_brightness < 60.0 || score > 60.0 {
            ("Severe Fatigue / Dark Circles", RiskTier::Moderate)
        } else if avg_brightness < 90.0 || score > 30.0 {
            ("Mild Fatigue / Tired Eyes", RiskTier::Moderate)
        } else {
            ("Rested", RiskTier::Low)
        };

        Ok(DetectorSignal::new(self.kind(), score, label, tier)
            .with_ratio("darkRatio", darkness)
            .with_detail("avgUnderEyeBrightness", format!("{avg_brightness:.2}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::sampler::test_support::{paint, solid};

    const SCLERA: [u8; 3] = [230, 225, 220];
    const VESSEL: [u8; 3] = [200, 60, 60];

    /// 100x100 frame whose redness region (50x50 = 2500 px) holds `red`
    /// vessel pixels and white sclera elsewhere.
    fn eye_with_red_pixels(red: u32) -> RgbImage {
        let mut img = solid(100, 100, SCLERA);
        let mut painted = 0;
        'rows: for y in 25..75 {
            for x in 25..75 {
                if painted == red {
                    break 'rows;
                }
                img.put_pixel(x, y, image::Rgb(VESSEL));
                painted += 1;
            }
        }
        img
    }

    #[test]
    fn redness_ratio_sixteen_percent_is_severe() {
        // 400 / 2500 = 0.16 -> score 64
        let signal = RednessDetector.analyze(&eye_with_red_pixels(400)).unwrap();
        assert_eq!(signal.score, 64);
        assert_eq!(signal.label, "Severe Inflammation");
        assert_eq!(signal.risk_tier, RiskTier::High);
        assert_eq!(signal.details["ratio"], "0.1600");
    }

    #[test]
    fn redness_ratio_ten_percent_is_irritated() {
        // 250 / 2500 = 0.10 -> score 40
        let signal = RednessDetector.analyze(&eye_with_red_pixels(250)).unwrap();
        assert_eq!(signal.score, 40);
        assert_eq!(signal.label, "Irritated / Red");
        assert_eq!(signal.risk_tier, RiskTier::Moderate);
    }

    #[test]
    fn clean_sclera_is_healthy() {
        let signal = RednessDetector.analyze(&eye_with_red_pixels(0)).unwrap();
        assert_eq!(signal.score, 0);
        assert_eq!(signal.label, "Healthy");
        assert_eq!(signal.risk_tier, RiskTier::Low);
    }

    #[test]
    fn mild_redness_ladder_rung() {
        // 125 / 2500 = 0.05 -> score 20
        let signal = RednessDetector.analyze(&eye_with_red_pixels(125)).unwrap();
        assert_eq!(signal.score, 20);
        assert_eq!(signal.label, "Mild Redness");
        assert_eq!(signal.risk_tier, RiskTier::Low);
    }

    #[test]
    fn no_eye_area_is_unclear() {
        let img = solid(100, 100, [40, 90, 40]);
        let signal = RednessDetector.analyze(&img).unwrap();
        assert_eq!(signal.score, 0);
        assert_eq!(signal.label, "Unclear (Low Confidence)");
        assert_eq!(signal.risk_tier, RiskTier::Unknown);
    }

    #[test]
    fn dark_pupil_is_clear_regardless_of_ratio() {
        let img = solid(100, 100, [40, 40, 40]);
        let signal = LensCloudinessDetector.analyze(&img).unwrap();
        assert_eq!(signal.label, "Clear Pupil");
        assert_eq!(signal.risk_tier, RiskTier::Low);
        assert_eq!(signal.score, 0);
    }

    #[test]
    fn gray_bright_pupil_is_cloudy() {
        let mut img = solid(100, 100, [20, 20, 20]);
        paint(&mut img, 0.40, 0.40, 0.60, 0.60, [180, 180, 175]);
        let signal = LensCloudinessDetector.analyze(&img).unwrap();
        assert_eq!(signal.score, 100);
        assert_eq!(signal.label, "Cloudy / Hazy");
        assert_eq!(signal.risk_tier, RiskTier::High);
    }

    #[test]
    fn partial_haze_is_moderate() {
        // 3 of the 20 sampled columns are gray-bright: 60 / 400 = 0.15 -> score 30.
        let mut img = solid(100, 100, [30, 60, 200]);
        paint(&mut img, 0.40, 0.40, 0.43, 0.60, [180, 180, 180]);
        let signal = LensCloudinessDetector.analyze(&img).unwrap();
        assert_eq!(signal.score, 30);
        assert_eq!(signal.label, "Mild Haze");
        assert_eq!(signal.risk_tier, RiskTier::Moderate);
    }

    #[test]
    fn bright_under_eye_is_rested() {
        let img = solid(100, 100, [200, 170, 150]);
        let signal = FatigueDetector.analyze(&img).unwrap();
        assert_eq!(signal.label, "Rested");
        assert_eq!(signal.risk_tier, RiskTier::Low);
    }

    #[test]
    fn dark_under_eye_is_fatigue_but_never_high() {
        let img = solid(100, 100, [40, 30, 30]);
        let signal = FatigueDetector.analyze(&img).unwrap();
        assert_eq!(signal.label, "Severe Fatigue / Dark Circles");
        assert_eq!(signal.risk_tier, RiskTier::Moderate);
        assert_eq!(signal.score, 100);
    }

    #[test]
    fn dim_under_eye_is_mild_fatigue() {
        let img = solid(100, 100, [85, 85, 85]);
        let signal = FatigueDetector.analyze(&img).unwrap();
        assert_eq!(signal.label, "Mild Fatigue / Tired Eyes");
        assert_eq!(signal.score, 0);
    }
}
