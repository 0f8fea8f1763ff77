use anyhow::{Context, Result};
use image::RgbaImage;
use xcap::Monitor;

use crate::capture::FrameSource;

/// Captures the whole primary monitor. Regions are in that monitor's
/// coordinate space.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonitorFrameSource;

impl MonitorFrameSource {
    pub fn new() -> Self {
        Self
    }

    fn grab(&self) -> Result<RgbaImage> {
        let monitors = Monitor::all().context("Failed to get monitors")?;
        let monitor = monitors.first().context("No monitor found")?;

        let image = monitor.capture_image().context("Failed to capture screen")?;
        let (width, height) = (image.width(), image.height());
        RgbaImage::from_raw(width, height, image.into_raw())
            .context("Capture buffer does not match its dimensions")
    }
}

impl FrameSource for MonitorFrameSource {
    fn capture_frame(&self) -> Option<RgbaImage> {
        match self.grab() {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!("[CAPTURE] Screen capture unavailable: {:#}", e);
                None
            }
        }
    }
}
