use std::sync::Arc;

use glance_core::binarize;
use glance_types::CaptureRegion;
use image::DynamicImage;

/// One successful capture: the cropped region, the frame it came from, and
/// a single-slot memo of the last binarization.
///
/// The memo, when present, is always `crop` binarized at `threshold`.
#[derive(Debug, Clone)]
pub struct CapturedScreenshot {
    crop: Arc<DynamicImage>,
    original: Arc<DynamicImage>,
    region: CaptureRegion,
    threshold: u8,
    memo: Option<Arc<DynamicImage>>,
}

impl CapturedScreenshot {
    pub fn new(
        crop: DynamicImage,
        original: DynamicImage,
        region: CaptureRegion,
        threshold: u8,
    ) -> Self {
        Self {
            crop: Arc::new(crop),
            original: Arc::new(original),
            region,
            threshold,
            memo: None,
        }
    }

    /// Memoized binarization, computed at the current threshold if missing
    pub fn cached(&mut self) -> Arc<DynamicImage> {
        if let Some(image) = &self.memo {
            return Arc::clone(image);
        }
        self.processed(self.threshold)
    }

    /// Recompute at `threshold` and replace the memo
    pub fn processed(&mut self, threshold: u8) -> Arc<DynamicImage> {
        let image = Arc::new(DynamicImage::ImageLuma8(binarize(&self.crop, threshold)));
        self.threshold = threshold;
        self.memo = Some(Arc::clone(&image));
        image
    }

    pub fn crop(&self) -> &Arc<DynamicImage> {
        &self.crop
    }

    pub fn original(&self) -> &Arc<DynamicImage> {
        &self.original
    }

    /// Overlay position the frame was checked against
    pub fn region(&self) -> CaptureRegion {
        self.region
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}
