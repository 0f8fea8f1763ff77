use std::sync::Arc;

use glance_types::{CaptureRegion, RecognitionResult};
use image::DynamicImage;

use crate::error::EngineError;

/// One recognition request, handed to the worker exactly once
#[derive(Debug, Clone)]
pub struct Job {
    /// Caller-chosen tag echoed back in every event for this job
    pub id: u64,
    /// Image handed to the engine; binarized or the raw crop
    pub image: Arc<DynamicImage>,
    /// Unprocessed crop, returned with the result for display
    pub crop: Arc<DynamicImage>,
    pub region: CaptureRegion,
    pub instant: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    Recognized {
        result: RecognitionResult,
        crop: Arc<DynamicImage>,
    },
    /// Engine ran fine but produced no candidates
    NoTextFound { region: CaptureRegion, instant: bool },
    Failed { instant: bool, error: EngineError },
}

impl RecognitionOutcome {
    pub fn instant(&self) -> bool {
        match self {
            RecognitionOutcome::Recognized { result, .. } => result.instant,
            RecognitionOutcome::NoTextFound { instant, .. } => *instant,
            RecognitionOutcome::Failed { instant, .. } => *instant,
        }
    }
}

/// Sent from the worker thread back to the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// A job left the mailbox and recognition is starting
    Started { job: u64, instant: bool },
    Finished { job: u64, outcome: RecognitionOutcome },
}
