mod engine;
mod error;
mod job;
mod worker;

pub use engine::{
    AbortFlag, AbortHandle, RecognitionEngine, RecognizedSymbol, symbols_to_candidates,
};
pub use error::EngineError;
pub use job::{Job, RecognitionOutcome, WorkerEvent};
pub use worker::{Lifecycle, RecognitionWorker};
