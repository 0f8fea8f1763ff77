use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::DynamicImage;

/// Fire-and-forget persistence of images for post-hoc debugging
pub trait DiagnosticSink: Send + Sync {
    /// Store `image` under `label`. Failures are logged, never returned.
    fn save(&self, image: &DynamicImage, label: &str);
}

/// Writes `<dir>/<label>_<nanos>.png`
pub struct FsDiagnosticSink {
    dir: PathBuf,
}

impl FsDiagnosticSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        self.dir.join(format!("{label}_{nanos}.png"))
    }
}

impl DiagnosticSink for FsDiagnosticSink {
    fn save(&self, image: &DynamicImage, label: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!("Failed to create {}: {}", self.dir.display(), e);
            return;
        }

        let path = self.path_for(label);
        match image.save(&path) {
            Ok(()) => tracing::debug!("Saved {}", path.display()),
            Err(e) => tracing::warn!("Failed to save {}: {}", path.display(), e),
        }
    }
}

/// Discards everything
pub struct NullDiagnosticSink;

impl DiagnosticSink for NullDiagnosticSink {
    fn save(&self, _image: &DynamicImage, _label: &str) {}
}
