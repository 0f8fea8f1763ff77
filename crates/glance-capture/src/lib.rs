mod capture;
mod error;
mod monitor;
mod readiness;
mod screenshot;

pub use capture::{CaptureLoop, CaptureOutcome, FrameSource, RegionSource, SharedRegion};
pub use error::CaptureError;
pub use monitor::MonitorFrameSource;
pub use readiness::{
    ReadinessDetector, is_acceptable_alternate_ready_color, is_color_within_tolerance,
    is_rgb_within_tolerance,
};
pub use screenshot::CapturedScreenshot;
