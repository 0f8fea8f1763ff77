use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env_or;

fn default_show_preview() -> bool {
    true
}

fn default_double_tap_cooldown_ms() -> u64 {
    500
}

fn default_min_size() -> u32 {
    40
}

fn default_instant_size_multiplier() -> u32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Show the binarized capture inside the overlay
    #[serde(default = "default_show_preview")]
    pub show_preview: bool,
    /// Recognize small captures on release without a double-tap
    pub instant_mode: bool,
    #[serde(default = "default_double_tap_cooldown_ms")]
    pub double_tap_cooldown_ms: u64,
    /// Smallest overlay edge in device pixels
    #[serde(default = "default_min_size")]
    pub min_size: u32,
    #[serde(default = "default_instant_size_multiplier")]
    pub instant_size_multiplier: u32,
}

impl UiConfig {
    pub fn new() -> Self {
        Self {
            instant_mode: env_or("GLANCE_INSTANT_MODE", false),
            show_preview: env_or("GLANCE_SHOW_PREVIEW", default_show_preview()),
            ..Self::default()
        }
    }

    pub fn double_tap_cooldown(&self) -> Duration {
        Duration::from_millis(self.double_tap_cooldown_ms)
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_preview: default_show_preview(),
            instant_mode: false,
            double_tap_cooldown_ms: default_double_tap_cooldown_ms(),
            min_size: default_min_size(),
            instant_size_multiplier: default_instant_size_multiplier(),
        }
    }
}
