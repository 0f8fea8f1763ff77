use std::time::Duration;

use glance_types::CaptureRegion;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("No frame available from the capture provider")]
    NoFrameAvailable,

    #[error("Overlay still visible after {elapsed:?}")]
    TimedOut { elapsed: Duration },

    #[error("Region {0} leaves nothing to crop")]
    RegionTooSmall(CaptureRegion),

    #[error("Capture thread panicked: {0}")]
    Panicked(String),
}
