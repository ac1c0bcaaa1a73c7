//! Health-scan analysis pipeline.
//!
//! A photo enters as an [`ImageBuffer`], the orchestrator tries the resolved
//! inference backend first and falls back to the pixel-heuristic ensemble:
//!
//! - `sampler`: decode + fractional region iteration
//! - `detectors`: nine fixed-threshold signal extractors, three per domain
//! - `ensemble`: per-domain classification of the three signals
//! - `heuristic`: concurrent detector run + classification, fully offline
//! - `normalize`: coerce backend JSON into the shared outcome shape
//! - `orchestrator`: state machine tying it together

pub mod detectors;
pub mod ensemble;
pub mod heuristic;
pub mod image_buffer;
pub mod normalize;
pub mod orchestrator;
pub mod prompts;
pub mod sampler;
pub mod signal;

pub use image_buffer::ImageBuffer;
pub use orchestrator::{AnalysisOrchestrator, AnalysisReport, AnalysisStage};
pub use signal::DetectorSignal;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::inference::BackendError;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Image could not be decoded: {0}")]
    Decode(String),

    #[error("Detector {detector} failed: {reason}")]
    Detector { detector: String, reason: String },

    #[error("No inference backend is configured")]
    BackendUnavailable,

    #[error("Inference backend failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Inference backend timed out after {}ms", .0.as_millis())]
    Timeout(std::time::Duration),

    #[error("Inference task aborted: {0}")]
    TaskAborted(String),

    #[error("Backend reply is not valid analysis JSON: {reason}")]
    ResponseParse { reason: String, raw: String },

    #[error("Persistence failed: {0}")]
    Persistence(#[from] DatabaseError),
}
