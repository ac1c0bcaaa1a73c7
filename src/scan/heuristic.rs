//! Offline analysis path: decode once, run the domain's three detectors as
//! concurrent blocking tasks over the shared image, then classify.

use std::sync::Arc;

use image::RgbImage;

use super::detectors::{detectors_for, run_guarded, Detector};
use super::ensemble::{classify, rules_for};
use super::image_buffer::ImageBuffer;
use super::sampler;
use super::signal::DetectorSignal;
use super::AnalysisError;
use crate::models::{ScanOutcome, ScanType};

/// Full heuristic analysis of one photo.
pub async fn analyze(scan_type: ScanType, image: &ImageBuffer) -> Result<ScanOutcome, AnalysisError> {
    let decoded = decode(image).await?;
    Ok(classify_decoded(scan_type, decoded).await)
}

/// Decode on a blocking task. The result is shared by all three detectors.
pub async fn decode(image: &ImageBuffer) -> Result<Arc<RgbImage>, AnalysisError> {
    let image = image.clone();
    tokio::task::spawn_blocking(move || sampler::decode(&image))
        .await
        .map_err(|e| AnalysisError::Decode(format!("Decoder task failed: {e}")))?
        .map(Arc::new)
}

pub async fn classify_decoded(scan_type: ScanType, image: Arc<RgbImage>) -> ScanOutcome {
    let signals = run_detectors(scan_type, image).await;
    classify(rules_for(scan_type), &signals)
}

/// Signals come back in the domain's detector order.
pub async fn run_detectors(scan_type: ScanType, image: Arc<RgbImage>) -> [DetectorSignal; 3] {
    let [first, second, third] = detectors_for(scan_type);
    let (a, b, c) = tokio::join!(
        run_one(first, Arc::clone(&image)),
        run_one(second, Arc::clone(&image)),
        run_one(third, image),
    );
    [a, b, c]
}

async fn run_one(detector: &'static dyn Detector, image: Arc<RgbImage>) -> DetectorSignal {
    let kind = detector.kind();
    match tokio::task::spawn_blocking(move || run_guarded(detector, &image)).await {
        Ok(signal) => signal,
        Err(e) => {
            let err = AnalysisError::Detector {
                detector: kind.to_string(),
                reason: e.to_string(),
            };
            tracing::warn!(error = %err, "Detector task did not complete");
            DetectorSignal::error(kind, &err.to_string())
        }
    }
}
