//! Fixed-threshold pixel detectors, three per anatomical domain.
//!
//! Every detector samples a sub-rectangle, buckets pixels by brightness and
//! chromatic tests, and walks an ordered threshold ladder (most severe rung
//! first). Detectors are stateless unit structs so a domain set can be shared
//! across blocking tasks without locking.

pub mod eyes;
pub mod skin;
pub mod teeth;

use std::panic::{catch_unwind, AssertUnwindSafe};

use image::RgbImage;
use thiserror::Error;

use super::signal::DetectorSignal;
use crate::models::{DetectorKind, ScanType};

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("{0}")]
    Failed(String),
}

pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn analyze(&self, image: &RgbImage) -> Result<DetectorSignal, DetectorError>;
}

/// Run a detector, converting an error or a panic into an `Error`-tier
/// signal so the other detectors of the domain still count.
pub fn run_guarded(detector: &dyn Detector, image: &RgbImage) -> DetectorSignal {
    let kind = detector.kind();
    match catch_unwind(AssertUnwindSafe(|| detector.analyze(image))) {
        Ok(Ok(signal)) => signal,
        Ok(Err(err)) => {
            tracing::warn!(detector = %kind, error = %err, "Detector failed, degrading signal");
            DetectorSignal::error(kind, &err.to_string())
        }
        Err(_) => {
            tracing::warn!(detector = %kind, "Detector panicked, degrading signal");
            DetectorSignal::error(kind, "detector panicked")
        }
    }
}

static EYE_DETECTORS: [&dyn Detector; 3] = [
    &eyes::RednessDetector,
    &eyes::LensCloudinessDetector,
    &eyes::FatigueDetector,
];

static TEETH_DETECTORS: [&dyn Detector; 3] = [
    &teeth::HygieneDetector,
    &teeth::CavityDetector,
    &teeth::GumInflammationDetector,
];

static SKIN_DETECTORS: [&dyn Detector; 3] = [
    &skin::SkinToneDetector,
    &skin::MoleDetector,
    &skin::TextureDetector,
];

/// The domain's detectors, in the order the ensemble expects their signals.
pub fn detectors_for(scan_type: ScanType) -> [&'static dyn Detector; 3] {
    match scan_type {
        ScanType::Eyes => EYE_DETECTORS,
        ScanType::Teeth => TEETH_DETECTORS,
        ScanType::Skin => SKIN_DETECTORS,
    }
}

fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskTier;

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn kind(&self) -> DetectorKind {
            DetectorKind::Cavity
        }

        fn analyze(&self, _image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
            Err(DetectorError::Failed("sensor fault".into()))
        }
    }

    struct PanickingDetector;

    impl Detector for PanickingDetector {
        fn kind(&self) -> DetectorKind {
            DetectorKind::Mole
        }

        fn analyze(&self, _image: &RgbImage) -> Result<DetectorSignal, DetectorError> {
            panic!("index out of bounds");
        }
    }

    #[test]
    fn error_becomes_degraded_signal() {
        let img = RgbImage::new(10, 10);
        let signal = run_guarded(&FailingDetector, &img);
        assert_eq!(signal.risk_tier, RiskTier::Error);
        assert_eq!(signal.score, 0);
        assert_eq!(signal.detector, DetectorKind::Cavity);
    }

    #[test]
    fn panic_becomes_degraded_signal() {
        let img = RgbImage::new(10, 10);
        let signal = run_guarded(&PanickingDetector, &img);
        assert_eq!(signal.risk_tier, RiskTier::Error);
        assert_eq!(signal.detector, DetectorKind::Mole);
    }

    #[test]
    fn every_domain_has_three_distinct_detectors() {
        for scan_type in [ScanType::Eyes, ScanType::Teeth, ScanType::Skin] {
            let kinds: Vec<_> = detectors_for(scan_type).iter().map(|d| d.kind()).collect();
            assert_eq!(kinds.len(), 3);
            assert_ne!(kinds[0], kinds[1]);
            assert_ne!(kinds[1], kinds[2]);
        }
    }

    #[test]
    fn all_detectors_stay_in_bounds_on_extreme_images() {
        let images = [
            RgbImage::from_pixel(40, 40, image::Rgb([0, 0, 0])),
            RgbImage::from_pixel(40, 40, image::Rgb([255, 255, 255])),
            RgbImage::from_pixel(40, 40, image::Rgb([255, 0, 0])),
            RgbImage::from_pixel(40, 40, image::Rgb([120, 80, 40])),
            RgbImage::from_fn(40, 40, |x, y| {
                if (x + y) % 2 == 0 {
                    image::Rgb([255, 0, 0])
                } else {
                    image::Rgb([0, 0, 0])
                }
            }),
            RgbImage::new(1, 1),
        ];
        for scan_type in [ScanType::Eyes, ScanType::Teeth, ScanType::Skin] {
            for detector in detectors_for(scan_type) {
                for img in &images {
                    let signal = run_guarded(detector, img);
                    assert!(signal.score <= 100);
                    assert_ne!(signal.risk_tier, RiskTier::Error, "{} errored", signal.detector);
                }
            }
        }
    }
}
