use std::time::Duration;

use glance_types::TextOrientation;
use serde::{Deserialize, Serialize};

fn default_idle_poll_ms() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub orientation: TextOrientation,
    /// Sleep between cancel attempts while waiting for the worker to go idle
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
}

impl OcrConfig {
    pub fn new() -> Self {
        let orientation = match std::env::var("GLANCE_TEXT_ORIENTATION").as_deref() {
            Ok("vertical") => TextOrientation::Vertical,
            _ => TextOrientation::Horizontal,
        };

        Self {
            orientation,
            ..Self::default()
        }
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            orientation: TextOrientation::Horizontal,
            idle_poll_ms: default_idle_poll_ms(),
        }
    }
}
