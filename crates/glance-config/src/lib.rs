use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use self::capture::CaptureConfig;
use self::diagnostics::DiagnosticsConfig;
use self::ocr::OcrConfig;
use self::ui::UiConfig;

pub mod capture;
pub mod diagnostics;
pub mod ocr;
pub mod ui;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub ocr: OcrConfig,
    pub ui: UiConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn new() -> Self {
        Config {
            capture: CaptureConfig::new(),
            ocr: OcrConfig::new(),
            ui: UiConfig::new(),
            diagnostics: DiagnosticsConfig::new(),
        }
    }

    /// Load a JSON profile; missing fields fall back to defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_profile_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "ui": { "instant_mode": true, "min_size": 64 } }"#)
                .unwrap();
        assert!(config.ui.instant_mode);
        assert_eq!(config.ui.min_size, 64);
        assert_eq!(config.ui.double_tap_cooldown_ms, 500);
        assert_eq!(config.capture.default_threshold, 128);
        assert_eq!(config.capture.tolerance, 2);
        assert_eq!(config.capture.timeout_ms, 4000);
        assert_eq!(config.capture.timeout(), std::time::Duration::from_millis(4000));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.capture.armed_color, config.capture.armed_color);
        assert_eq!(back.ocr.orientation, config.ocr.orientation);
    }
}
