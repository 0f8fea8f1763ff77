use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env_or;

fn default_timeout_ms() -> u64 {
    4000
}

fn default_border_inset_dp() -> u32 {
    1
}

fn default_border_rounding_px() -> u32 {
    1
}

fn default_display_density() -> f32 {
    1.0
}

fn default_tolerance() -> u8 {
    2
}

fn default_armed_color() -> u32 {
    0xFF0000
}

fn default_threshold() -> u8 {
    128
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Give up waiting for a clean frame after this long
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Overlay border width in device-independent pixels
    #[serde(default = "default_border_inset_dp")]
    pub border_inset_dp: u32,
    /// Extra pixels trimmed on each side for rounding errors
    #[serde(default = "default_border_rounding_px")]
    pub border_rounding_px: u32,
    /// Device pixels per device-independent pixel
    #[serde(default = "default_display_density")]
    pub display_density: f32,
    /// Per-channel tolerance when matching the armed colour
    #[serde(default = "default_tolerance")]
    pub tolerance: u8,
    /// Armed border colour as 0xRRGGBB
    #[serde(default = "default_armed_color")]
    pub armed_color: u32,
    #[serde(default = "default_threshold")]
    pub default_threshold: u8,
}

impl CaptureConfig {
    pub fn new() -> Self {
        Self {
            timeout_ms: env_or("GLANCE_CAPTURE_TIMEOUT_MS", default_timeout_ms()),
            display_density: env_or("GLANCE_DISPLAY_DENSITY", default_display_density()),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Pixels trimmed from each side of the region before cropping
    pub fn border_inset_px(&self) -> u32 {
        let dp = (self.border_inset_dp as f32 * self.display_density).round() as u32;
        dp + self.border_rounding_px
    }

    pub fn armed_rgb(&self) -> [u8; 3] {
        [
            (self.armed_color >> 16) as u8,
            (self.armed_color >> 8) as u8,
            self.armed_color as u8,
        ]
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            border_inset_dp: default_border_inset_dp(),
            border_rounding_px: default_border_rounding_px(),
            display_density: default_display_density(),
            tolerance: default_tolerance(),
            armed_color: default_armed_color(),
            default_threshold: default_threshold(),
        }
    }
}
