#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Recognition failed: {0}")]
    Failed(String),

    #[error("Recognition aborted")]
    Aborted,

    #[error("Engine panicked: {0}")]
    Panicked(String),
}
