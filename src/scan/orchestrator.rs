//! Analysis state machine.
//!
//! ```text
//! Received -> AttemptAiVision -> AiResultParsed | AiUnavailableOrFailed
//!          -> HeuristicFallback (failure branch only) -> ResultNormalized
//!          -> Persisted -> UrgencyCheck -> Done
//! ```
//!
//! Paths are walked in [`ANALYSIS_PATHS`] order; the first that produces an
//! outcome wins. Only persistence failures reach the caller.

use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use super::ensemble::RETAKE_RECOMMENDATION;
use super::image_buffer::ImageBuffer;
use super::{heuristic, normalize, prompts, AnalysisError};
use crate::db::ScanStore;
use crate::inference::BackendRegistry;
use crate::models::{AnalysisPath, ScanOutcome, ScanRecord, ScanType, Severity};
use crate::urgent_care::{UrgentCareLocator, UrgentCareOffer};

/// Tried in order.
pub const ANALYSIS_PATHS: [AnalysisPath; 2] = [AnalysisPath::AiVision, AnalysisPath::Heuristic];

const UNSUPPORTED_NOTE: &str = "Analysis for this scan type coming soon.";
const UNSUPPORTED_RECOMMENDATION: &str = "Consult a specialist";
const UNREADABLE_NOTE: &str = "Could not read this photo. Please upload a clear JPEG or PNG image.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisStage {
    Received,
    AttemptAiVision,
    AiResultParsed,
    AiUnavailableOrFailed,
    HeuristicFallback,
    ResultNormalized,
    Persisted,
    UrgencyCheck,
    Done,
}

/// Normalized outcome plus how it was reached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub outcome: ScanOutcome,
    pub scan_type: String,
    pub image_ref: String,
    pub analysis_path: AnalysisPath,
    pub backend: Option<String>,
    pub record_id: Option<Uuid>,
    pub urgent_care: Option<UrgentCareOffer>,
    pub stages: Vec<AnalysisStage>,
}

pub struct AnalysisOrchestrator {
    registry: Arc<BackendRegistry>,
    store: Arc<dyn ScanStore>,
    locator: Arc<dyn UrgentCareLocator>,
    backend_timeout: Duration,
}

impl AnalysisOrchestrator {
    pub fn new(
        registry: Arc<BackendRegistry>,
        store: Arc<dyn ScanStore>,
        locator: Arc<dyn UrgentCareLocator>,
        backend_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            locator,
            backend_timeout,
        }
    }

    /// Analyze one photo for `owner_id`. `scan_tag` is the raw inbound tag.
    pub async fn analyze(
        &self,
        owner_id: &str,
        scan_tag: &str,
        image: ImageBuffer,
    ) -> Result<AnalysisReport, AnalysisError> {
        let mut stages = vec![AnalysisStage::Received];
        let image_ref = image.image_ref();

        let Some(scan_type) = ScanType::parse(scan_tag) else {
            tracing::info!(scan_tag, "Unsupported scan type");
            stages.extend([AnalysisStage::ResultNormalized, AnalysisStage::Done]);
            return Ok(AnalysisReport {
                outcome: ScanOutcome::inconclusive(
                    UNSUPPORTED_NOTE,
                    vec![UNSUPPORTED_RECOMMENDATION.to_string()],
                ),
                scan_type: scan_tag.trim().to_ascii_lowercase(),
                image_ref,
                analysis_path: AnalysisPath::Unsupported,
                backend: None,
                record_id: None,
                urgent_care: None,
                stages,
            });
        };

        // Unreadable photos never reach a backend.
        let decoded = match image.validate() {
            Ok(()) => heuristic::decode(&image).await,
            Err(err) => Err(err),
        };
        let (path, outcome, backend) = match decoded {
            Ok(decoded) => self.walk_paths(scan_type, &image, decoded, &mut stages).await,
            Err(err) => {
                tracing::warn!(%scan_type, error = %err, "Rejected image before analysis");
                (AnalysisPath::Heuristic, unreadable_outcome(), None)
            }
        };
        stages.push(AnalysisStage::ResultNormalized);

        let record = ScanRecord::new(owner_id, scan_type, outcome.clone(), &image_ref, path);
        let store = Arc::clone(&self.store);
        let pending = record.clone();
        tokio::task::spawn_blocking(move || store.create(&pending))
            .await
            .map_err(|e| AnalysisError::TaskAborted(format!("persistence task: {e}")))??;
        stages.push(AnalysisStage::Persisted);

        stages.push(AnalysisStage::UrgencyCheck);
        let urgent_care = if outcome.severity == Severity::High {
            self.locator.offer(owner_id, scan_type, &outcome)
        } else {
            None
        };
        stages.push(AnalysisStage::Done);

        tracing::info!(
            %scan_type,
            path = %path,
            result = %outcome.result,
            confidence = outcome.confidence,
            record_id = %record.id,
            "Scan analyzed"
        );

        Ok(AnalysisReport {
            outcome,
            scan_type: scan_type.to_string(),
            image_ref,
            analysis_path: path,
            backend,
            record_id: Some(record.id),
            urgent_care,
            stages,
        })
    }

    async fn walk_paths(
        &self,
        scan_type: ScanType,
        image: &ImageBuffer,
        decoded: Arc<RgbImage>,
        stages: &mut Vec<AnalysisStage>,
    ) -> (AnalysisPath, ScanOutcome, Option<String>) {
        for path in ANALYSIS_PATHS {
            let attempt = match path {
                AnalysisPath::AiVision => self.attempt_ai(scan_type, image, stages).await,
                AnalysisPath::Heuristic => {
                    stages.push(AnalysisStage::HeuristicFallback);
                    let outcome = heuristic::classify_decoded(scan_type, Arc::clone(&decoded)).await;
                    Ok((outcome, None))
                }
                AnalysisPath::Unsupported => continue,
            };

            match attempt {
                Ok((outcome, backend)) => return (path, outcome, backend),
                Err(err) => {
                    if path == AnalysisPath::AiVision {
                        stages.push(AnalysisStage::AiUnavailableOrFailed);
                    }
                    match err {
                        AnalysisError::BackendUnavailable => {
                            tracing::debug!(%scan_type, "No inference backend, using heuristics");
                        }
                        other => {
                            tracing::warn!(%scan_type, path = %path, error = %other, "Analysis path failed");
                        }
                    }
                }
            }
        }
        (AnalysisPath::Heuristic, unreadable_outcome(), None)
    }

    async fn attempt_ai(
        &self,
        scan_type: ScanType,
        image: &ImageBuffer,
        stages: &mut Vec<AnalysisStage>,
    ) -> Result<(ScanOutcome, Option<String>), AnalysisError> {
        stages.push(AnalysisStage::AttemptAiVision);
        let (backend, name) = self.registry.resolve().ok_or(AnalysisError::BackendUnavailable)?;

        let prompt = prompts::vision_prompt(scan_type);
        let image = image.clone();
        let call = tokio::task::spawn_blocking(move || backend.analyze_image(&image, &prompt));

        let span = tracing::info_span!("backend_call", backend = %name, %scan_type);
        let raw = match tokio::time::timeout(self.backend_timeout, call)
            .instrument(span)
            .await
        {
            Err(_) => return Err(AnalysisError::Timeout(self.backend_timeout)),
            Ok(Err(join)) => return Err(AnalysisError::TaskAborted(join.to_string())),
            Ok(Ok(reply)) => reply?,
        };

        stages.push(AnalysisStage::AiResultParsed);
        Ok((normalize::normalize_backend_reply(&raw), Some(name)))
    }
}

fn unreadable_outcome() -> ScanOutcome {
    ScanOutcome::inconclusive(UNREADABLE_NOTE, vec![RETAKE_RECOMMENDATION.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FailingScanStore, SqliteScanStore};
    use crate::inference::mock::MockFailure;
    use crate::inference::{BackendKind, InferenceBackend, MockBackend};
    use crate::models::Category;
    use crate::scan::sampler::test_support::{encode_png, solid};
    use crate::urgent_care::{AdvisoryLocator, NoLocator};

    const GOOD_REPLY: &str = r#"```json
{"result":"Concern","confidence":66,"notes":"Mild redness.","recommendations":["Rest your eyes"],"needsHospital":true,"severity":"high"}
```"#;

    struct Harness {
        orchestrator: AnalysisOrchestrator,
        store: Arc<SqliteScanStore>,
    }

    fn harness(backends: Vec<Arc<dyn InferenceBackend>>, timeout: Duration) -> Harness {
        let store = Arc::new(SqliteScanStore::in_memory().unwrap());
        let orchestrator = AnalysisOrchestrator::new(
            Arc::new(BackendRegistry::with_backends(None, backends)),
            store.clone(),
            Arc::new(AdvisoryLocator),
            timeout,
        );
        Harness { orchestrator, store }
    }

    fn photo(color: [u8; 3]) -> ImageBuffer {
        ImageBuffer::new(encode_png(&solid(100, 100, color)), "image/png")
    }

    fn json_keys(report: &AnalysisReport) -> std::collections::BTreeSet<String> {
        match serde_json::to_value(report).unwrap() {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            other => panic!("report serialized to {other}"),
        }
    }

    #[tokio::test]
    async fn no_backend_goes_straight_to_heuristics() {
        let h = harness(Vec::new(), Duration::from_secs(5));
        let report = h.orchestrator.analyze("u1", "skin", photo([175, 160, 140])).await.unwrap();

        assert_eq!(report.analysis_path, AnalysisPath::Heuristic);
        assert_eq!(report.outcome.result, Category::Healthy);
        assert_eq!(report.backend, None);
        assert_eq!(
            report.stages,
            vec![
                AnalysisStage::Received,
                AnalysisStage::AttemptAiVision,
                AnalysisStage::AiUnavailableOrFailed,
                AnalysisStage::HeuristicFallback,
                AnalysisStage::ResultNormalized,
                AnalysisStage::Persisted,
                AnalysisStage::UrgencyCheck,
                AnalysisStage::Done,
            ]
        );
        assert_eq!(h.store.list("u1", false).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unconfigured_backend_is_never_called() {
        let mock = Arc::new(
            MockBackend::new(BackendKind::PrimaryCloud)
                .with_vision_reply(GOOD_REPLY)
                .unconfigured(),
        );
        let h = harness(vec![mock.clone() as Arc<dyn InferenceBackend>], Duration::from_secs(5));
        let report = h.orchestrator.analyze("u1", "skin", photo([175, 160, 140])).await.unwrap();

        assert_eq!(mock.total_calls(), 0);
        assert_eq!(report.analysis_path, AnalysisPath::Heuristic);
        assert_eq!(report.outcome.result, Category::Healthy);
        assert_eq!(report.backend, None);
        assert!(report.stages.contains(&AnalysisStage::AiUnavailableOrFailed));
    }

    #[tokio::test]
    async fn backend_reply_is_normalized_and_persisted() {
        let mock = Arc::new(MockBackend::new(BackendKind::Local).with_vision_reply(GOOD_REPLY));
        let h = harness(vec![mock.clone() as Arc<dyn InferenceBackend>], Duration::from_secs(5));
        let report = h.orchestrator.analyze("u1", "eye", photo([230, 225, 220])).await.unwrap();

        assert_eq!(mock.vision_calls(), 1);
        assert!(mock.last_prompt().unwrap().contains("eye image"));
        assert_eq!(report.analysis_path, AnalysisPath::AiVision);
        assert_eq!(report.scan_type, "eyes");
        assert_eq!(report.backend.as_deref(), Some("mock:ollama"));
        assert_eq!(report.outcome.result, Category::Concern);
        // The model's "high" severity contradicts its own category.
        assert_eq!(report.outcome.severity, Severity::Moderate);
        assert!(!report.outcome.needs_hospital);
        assert!(!report.stages.contains(&AnalysisStage::HeuristicFallback));

        let stored = h.store.get("u1", &report.record_id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.outcome, report.outcome);
        assert_eq!(stored.analysis_path, AnalysisPath::AiVision);
        assert_eq!(stored.image_ref, report.image_ref);
    }

    #[tokio::test]
    async fn backend_timeout_falls_back_with_same_shape() {
        let mock = Arc::new(
            MockBackend::new(BackendKind::SecondaryCloud)
                .with_vision_reply(GOOD_REPLY)
                .with_delay(Duration::from_millis(1500)),
        );
        let h = harness(vec![mock.clone() as Arc<dyn InferenceBackend>], Duration::from_millis(200));
        let report = h.orchestrator.analyze("u1", "skin", photo([220, 90, 90])).await.unwrap();

        assert_eq!(mock.vision_calls(), 1);
        assert_eq!(report.analysis_path, AnalysisPath::Heuristic);
        assert!(report.stages.contains(&AnalysisStage::AiUnavailableOrFailed));
        assert_eq!(report.outcome.result, Category::Urgent);
        assert!(!report.outcome.recommendations.is_empty());
        assert!(report.record_id.is_some());

        let answered = Arc::new(MockBackend::new(BackendKind::Local).with_vision_reply(GOOD_REPLY));
        let ai = harness(vec![answered as Arc<dyn InferenceBackend>], Duration::from_secs(5))
            .orchestrator
            .analyze("u1", "skin", photo([220, 90, 90]))
            .await
            .unwrap();
        assert_eq!(ai.analysis_path, AnalysisPath::AiVision);
        assert_eq!(json_keys(&report), json_keys(&ai));
    }

    #[test]
    fn timeout_message_keeps_sub_second_precision() {
        let err = AnalysisError::Timeout(Duration::from_millis(200));
        assert_eq!(err.to_string(), "Inference backend timed out after 200ms");
    }

    #[tokio::test]
    async fn backend_failure_and_panic_fall_back() {
        for failure in [MockFailure::Connection, MockFailure::Unavailable, MockFailure::Panic] {
            let mock = Arc::new(MockBackend::new(BackendKind::PrimaryCloud).with_failure(failure));
            let h = harness(vec![mock.clone() as Arc<dyn InferenceBackend>], Duration::from_secs(5));
            let report = h.orchestrator.analyze("u1", "teeth", photo([230, 230, 230])).await.unwrap();
            assert_eq!(report.analysis_path, AnalysisPath::Heuristic, "{failure:?}");
            assert_eq!(mock.vision_calls(), 1);
        }
    }

    #[tokio::test]
    async fn prose_reply_is_inconclusive_without_heuristic_retry() {
        let mock = Arc::new(MockBackend::new(BackendKind::Local).with_vision_reply("Looks fine to me!"));
        let h = harness(vec![mock as Arc<dyn InferenceBackend>], Duration::from_secs(5));
        let report = h.orchestrator.analyze("u1", "eyes", photo([230, 225, 220])).await.unwrap();

        assert_eq!(report.analysis_path, AnalysisPath::AiVision);
        assert_eq!(report.outcome.result, Category::Inconclusive);
        assert_eq!(report.outcome.notes, "Looks fine to me!");
        assert!(!report.stages.contains(&AnalysisStage::HeuristicFallback));
    }

    #[tokio::test]
    async fn unsupported_type_is_returned_but_not_persisted() {
        let h = harness(Vec::new(), Duration::from_secs(5));
        let report = h.orchestrator.analyze("u1", "Hair", photo([100, 80, 60])).await.unwrap();

        assert_eq!(report.analysis_path, AnalysisPath::Unsupported);
        assert_eq!(report.scan_type, "hair");
        assert_eq!(report.outcome.result, Category::Inconclusive);
        assert_eq!(report.outcome.confidence, 0);
        assert_eq!(report.outcome.notes, UNSUPPORTED_NOTE);
        assert_eq!(report.outcome.recommendations, vec![UNSUPPORTED_RECOMMENDATION.to_string()]);
        assert_eq!(report.record_id, None);
        assert!(h.store.list("u1", true).unwrap().is_empty());
    }

    #[tokio::test]
    async fn undecodable_photo_is_inconclusive_and_persisted() {
        let mock = Arc::new(MockBackend::new(BackendKind::Local).with_vision_reply(GOOD_REPLY));
        let h = harness(vec![mock.clone() as Arc<dyn InferenceBackend>], Duration::from_secs(5));
        let junk = ImageBuffer::new(vec![0xAB; 500], "image/jpeg");
        let report = h.orchestrator.analyze("u1", "skin", junk).await.unwrap();

        assert_eq!(mock.total_calls(), 0);
        assert_eq!(report.analysis_path, AnalysisPath::Heuristic);
        assert_eq!(report.outcome.result, Category::Inconclusive);
        assert_eq!(report.outcome.recommendations, vec![RETAKE_RECOMMENDATION.to_string()]);
        assert_eq!(h.store.list("u1", false).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tiny_upload_skips_the_backend() {
        let mock = Arc::new(MockBackend::new(BackendKind::Local).with_vision_reply(GOOD_REPLY));
        let h = harness(vec![mock.clone() as Arc<dyn InferenceBackend>], Duration::from_secs(5));
        let report = h
            .orchestrator
            .analyze("u1", "eyes", ImageBuffer::new(vec![1u8; 10], "image/png"))
            .await
            .unwrap();

        assert_eq!(mock.total_calls(), 0);
        assert_eq!(report.outcome.result, Category::Inconclusive);
    }

    #[tokio::test]
    async fn urgent_result_attaches_offer() {
        let h = harness(Vec::new(), Duration::from_secs(5));
        let report = h.orchestrator.analyze("u1", "skin", photo([220, 90, 90])).await.unwrap();

        assert!(report.outcome.needs_hospital);
        let offer = report.urgent_care.unwrap();
        assert_eq!(offer.specialty, "Dermatologist");
    }

    #[tokio::test]
    async fn locator_may_decline() {
        let orchestrator = AnalysisOrchestrator::new(
            Arc::new(BackendRegistry::empty()),
            Arc::new(SqliteScanStore::in_memory().unwrap()),
            Arc::new(NoLocator),
            Duration::from_secs(5),
        );
        let report = orchestrator.analyze("u1", "skin", photo([220, 90, 90])).await.unwrap();
        assert!(report.outcome.needs_hospital);
        assert!(report.urgent_care.is_none());
        assert!(report.stages.contains(&AnalysisStage::UrgencyCheck));
    }

    #[tokio::test]
    async fn persistence_failure_propagates() {
        let orchestrator = AnalysisOrchestrator::new(
            Arc::new(BackendRegistry::empty()),
            Arc::new(FailingScanStore),
            Arc::new(AdvisoryLocator),
            Duration::from_secs(5),
        );
        let err = orchestrator
            .analyze("u1", "skin", photo([175, 160, 140]))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Persistence(_)));
    }

    #[tokio::test]
    async fn records_are_scoped_to_owner() {
        let h = harness(Vec::new(), Duration::from_secs(5));
        h.orchestrator.analyze("alice", "skin", photo([175, 160, 140])).await.unwrap();
        assert!(h.store.list("bob", true).unwrap().is_empty());
        assert_eq!(h.store.list("alice", true).unwrap().len(), 1);
    }
}
