use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::env_or;

fn default_enabled() -> bool {
    true
}

fn default_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Where debug and error screenshots are written
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
}

impl DiagnosticsConfig {
    pub fn new() -> Self {
        Self {
            enabled: env_or("GLANCE_DIAGNOSTICS", default_enabled()),
            dir: std::env::var("GLANCE_DIAGNOSTICS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_dir()),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            dir: default_dir(),
        }
    }
}
