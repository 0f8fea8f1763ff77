use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use glance_config::capture::CaptureConfig;
use glance_core::{DiagnosticSink, panic_message};
use glance_types::CaptureRegion;
use image::{DynamicImage, RgbaImage, imageops};
use kanal::Sender;
use parking_lot::RwLock;

use crate::error::CaptureError;
use crate::readiness::ReadinessDetector;
use crate::screenshot::CapturedScreenshot;

pub type CaptureOutcome = Result<CapturedScreenshot, CaptureError>;

/// Raw screen frames on demand
pub trait FrameSource: Send + Sync {
    /// A fresh frame, or `None` when the provider has nothing to give
    fn capture_frame(&self) -> Option<RgbaImage>;
}

/// Live on-screen position of the overlay
pub trait RegionSource: Send + Sync {
    fn current_region(&self) -> CaptureRegion;
}

/// Overlay position shared with capture threads. Only ever replaced whole.
#[derive(Debug, Clone)]
pub struct SharedRegion(Arc<RwLock<CaptureRegion>>);

impl SharedRegion {
    pub fn new(region: CaptureRegion) -> Self {
        Self(Arc::new(RwLock::new(region)))
    }

    pub fn set(&self, region: CaptureRegion) {
        *self.0.write() = region;
    }

    pub fn get(&self) -> CaptureRegion {
        *self.0.read()
    }
}

impl RegionSource for SharedRegion {
    fn current_region(&self) -> CaptureRegion {
        self.get()
    }
}

/// Polls the frame source until the overlay has hidden itself from the
/// frame, then crops the region out of it.
pub struct CaptureLoop {
    frames: Arc<dyn FrameSource>,
    region: Arc<dyn RegionSource>,
    diagnostics: Arc<dyn DiagnosticSink>,
    detector: ReadinessDetector,
    inset: u32,
    timeout: Duration,
}

impl CaptureLoop {
    pub fn new(
        frames: Arc<dyn FrameSource>,
        region: Arc<dyn RegionSource>,
        diagnostics: Arc<dyn DiagnosticSink>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            frames,
            region,
            diagnostics,
            detector: ReadinessDetector::from_config(config),
            inset: config.border_inset_px(),
            timeout: config.timeout(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Blocks until a clean frame arrives or the timeout elapses.
    ///
    /// There is no sleep between attempts; the provider's own latency paces
    /// the loop so the capture lands as soon as the overlay is gone.
    pub fn acquire(&self, threshold: u8) -> CaptureOutcome {
        let start = Instant::now();
        tracing::debug!("[CAPTURE] Waiting for {}", self.region.current_region());

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let Some(frame) = self.frames.capture_frame() else {
                tracing::debug!("[CAPTURE] Provider returned no frame");
                return Err(CaptureError::NoFrameAvailable);
            };

            // The overlay may be dragged while we wait; always use where it is now.
            let region = self.region.current_region();

            if self.detector.is_ready(&frame, region) {
                tracing::debug!(
                    "[CAPTURE] Ready after {} attempts in {:?}",
                    attempts,
                    start.elapsed()
                );
                return self.finish(frame, region, threshold);
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                tracing::warn!(
                    "[CAPTURE] Overlay still visible after {} attempts in {:?}",
                    attempts,
                    elapsed
                );
                self.record_failure(frame, region);
                return Err(CaptureError::TimedOut { elapsed });
            }
        }
    }

    /// Run [`acquire`](Self::acquire) on its own thread and send the outcome
    pub fn spawn_acquire(
        self: &Arc<Self>,
        threshold: u8,
        tx: Sender<CaptureOutcome>,
    ) -> std::io::Result<JoinHandle<()>> {
        let this = Arc::clone(self);
        std::thread::Builder::new()
            .name("glance-capture".to_string())
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| this.acquire(threshold)))
                    .unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        tracing::error!("[CAPTURE] Panicked: {}", message);
                        Err(CaptureError::Panicked(message))
                    });

                if tx.send(outcome).is_err() {
                    tracing::debug!("[CAPTURE] Receiver gone, dropping outcome");
                }
            })
    }

    fn finish(&self, frame: RgbaImage, region: CaptureRegion, threshold: u8) -> CaptureOutcome {
        let crop = crop_inside_border(&frame, region, self.inset);
        if crop.width() == 0 || crop.height() == 0 {
            return Err(CaptureError::RegionTooSmall(region));
        }

        Ok(CapturedScreenshot::new(
            DynamicImage::ImageRgba8(crop),
            DynamicImage::ImageRgba8(frame),
            region,
            threshold,
        ))
    }

    fn record_failure(&self, frame: RgbaImage, region: CaptureRegion) {
        let label = format!("error_{region}");
        let crop = crop_inside_border(&frame, region, self.inset);
        self.diagnostics
            .save(&DynamicImage::ImageRgba8(frame), &label);
        self.diagnostics
            .save(&DynamicImage::ImageRgba8(crop), &label);
    }
}

/// `region` shrunk by `inset` on every side, clipped to the frame.
/// Empty when nothing is left.
fn crop_inside_border(frame: &RgbaImage, region: CaptureRegion, inset: u32) -> RgbaImage {
    let Some(inner) = region.inset(inset) else {
        return RgbaImage::new(0, 0);
    };

    let left = i64::from(inner.x).max(0);
    let top = i64::from(inner.y).max(0);
    let right = (i64::from(inner.x) + i64::from(inner.width)).min(i64::from(frame.width()));
    let bottom = (i64::from(inner.y) + i64::from(inner.height)).min(i64::from(frame.height()));
    if right <= left || bottom <= top {
        return RgbaImage::new(0, 0);
    }

    imageops::crop_imm(
        frame,
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    )
    .to_image()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::Rgba;
    use parking_lot::Mutex;

    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREY: Rgba<u8> = Rgba([90, 90, 90, 255]);

    fn armed_frame(region: CaptureRegion) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(100, 100, GREY);
        let (l, t) = (region.x as u32, region.y as u32);
        let (r, b) = (l + region.width - 1, t + region.height - 1);
        for x in l..=r {
            frame.put_pixel(x, t, RED);
            frame.put_pixel(x, b, RED);
        }
        for y in t..=b {
            frame.put_pixel(l, y, RED);
            frame.put_pixel(r, y, RED);
        }
        frame
    }

    fn contaminated_frame() -> RgbaImage {
        RgbaImage::from_pixel(100, 100, GREY)
    }

    /// Hands out scripted frames, then repeats the fallback forever
    struct ScriptedFrames {
        script: Mutex<VecDeque<Option<RgbaImage>>>,
        fallback: Option<RgbaImage>,
        calls: AtomicUsize,
    }

    impl ScriptedFrames {
        fn new(script: Vec<Option<RgbaImage>>, fallback: Option<RgbaImage>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl FrameSource for ScriptedFrames {
        fn capture_frame(&self) -> Option<RgbaImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().pop_front() {
                Some(frame) => frame,
                None => self.fallback.clone(),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        labels: Mutex<Vec<(String, u32, u32)>>,
    }

    impl DiagnosticSink for RecordingSink {
        fn save(&self, image: &DynamicImage, label: &str) {
            self.labels
                .lock()
                .push((label.to_string(), image.width(), image.height()));
        }
    }

    fn config(timeout_ms: u64) -> CaptureConfig {
        CaptureConfig {
            timeout_ms,
            ..CaptureConfig::default()
        }
    }

    fn capture_loop(
        frames: Arc<ScriptedFrames>,
        region: SharedRegion,
        sink: Arc<RecordingSink>,
        timeout_ms: u64,
    ) -> CaptureLoop {
        CaptureLoop::new(frames, Arc::new(region), sink, &config(timeout_ms))
    }

    #[test]
    fn ready_frame_is_cropped_inside_border() {
        let region = CaptureRegion::new(10, 10, 50, 40);
        let frames = Arc::new(ScriptedFrames::new(vec![], Some(armed_frame(region))));
        let sink = Arc::new(RecordingSink::default());
        let capture = capture_loop(frames.clone(), SharedRegion::new(region), sink.clone(), 4000);

        let shot = capture.acquire(128).unwrap();

        assert_eq!(shot.region(), region);
        assert_eq!(shot.threshold(), 128);
        // default inset is 1dp + 1
        assert_eq!((shot.crop().width(), shot.crop().height()), (46, 36));
        assert_eq!(shot.original().width(), 100);
        assert_eq!(shot.crop().to_rgba8().get_pixel(0, 0), &GREY);
        assert_eq!(frames.calls.load(Ordering::SeqCst), 1);
        assert!(sink.labels.lock().is_empty());
    }

    #[test]
    fn retries_until_border_is_armed() {
        let region = CaptureRegion::new(10, 10, 30, 30);
        let frames = Arc::new(ScriptedFrames::new(
            vec![Some(contaminated_frame()), Some(contaminated_frame())],
            Some(armed_frame(region)),
        ));
        let capture = capture_loop(
            frames.clone(),
            SharedRegion::new(region),
            Arc::new(RecordingSink::default()),
            4000,
        );

        assert!(capture.acquire(90).is_ok());
        assert_eq!(frames.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn missing_frame_aborts_immediately() {
        let region = CaptureRegion::new(10, 10, 30, 30);
        let frames = Arc::new(ScriptedFrames::new(vec![None], Some(armed_frame(region))));
        let sink = Arc::new(RecordingSink::default());
        let capture = capture_loop(frames.clone(), SharedRegion::new(region), sink.clone(), 4000);

        assert_eq!(capture.acquire(128).unwrap_err(), CaptureError::NoFrameAvailable);
        assert_eq!(frames.calls.load(Ordering::SeqCst), 1);
        assert!(sink.labels.lock().is_empty());
    }

    #[test]
    fn timeout_records_frame_and_crop() {
        let region = CaptureRegion::new(10, 10, 30, 30);
        let frames = Arc::new(ScriptedFrames::new(vec![], Some(contaminated_frame())));
        let sink = Arc::new(RecordingSink::default());
        let capture = capture_loop(frames.clone(), SharedRegion::new(region), sink.clone(), 100);

        let start = Instant::now();
        let err = capture.acquire(128).unwrap_err();

        assert!(matches!(err, CaptureError::TimedOut { elapsed } if elapsed >= Duration::from_millis(100)));
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(frames.calls.load(Ordering::SeqCst) > 1);

        let labels = sink.labels.lock();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], ("error_(10,10)_(30,30)".to_string(), 100, 100));
        assert_eq!(labels[1], ("error_(10,10)_(30,30)".to_string(), 26, 26));
    }

    /// Moves the overlay after a few reads, like a drag landing mid-capture
    struct DraggedRegion {
        reads: AtomicUsize,
        before: CaptureRegion,
        after: CaptureRegion,
    }

    impl RegionSource for DraggedRegion {
        fn current_region(&self) -> CaptureRegion {
            if self.reads.fetch_add(1, Ordering::SeqCst) < 2 {
                self.before
            } else {
                self.after
            }
        }
    }

    #[test]
    fn uses_latest_region_for_check_and_crop() {
        let before = CaptureRegion::new(10, 10, 30, 30);
        let after = CaptureRegion::new(40, 40, 20, 24);
        let frames = Arc::new(ScriptedFrames::new(vec![], Some(armed_frame(after))));
        let region = Arc::new(DraggedRegion {
            reads: AtomicUsize::new(0),
            before,
            after,
        });
        let capture = CaptureLoop::new(
            frames.clone(),
            region,
            Arc::new(RecordingSink::default()),
            &config(4000),
        );

        let shot = capture.acquire(128).unwrap();

        assert_eq!(shot.region(), after);
        assert_eq!((shot.crop().width(), shot.crop().height()), (16, 20));
        assert!(frames.calls.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn border_only_region_is_too_small() {
        let region = CaptureRegion::new(10, 10, 4, 30);
        let frames = Arc::new(ScriptedFrames::new(vec![], Some(armed_frame(region))));
        let capture = capture_loop(
            frames,
            SharedRegion::new(region),
            Arc::new(RecordingSink::default()),
            4000,
        );

        assert_eq!(
            capture.acquire(128).unwrap_err(),
            CaptureError::RegionTooSmall(region)
        );
    }

    #[test]
    fn spawned_acquire_delivers_outcome() {
        let region = CaptureRegion::new(10, 10, 30, 30);
        let frames = Arc::new(ScriptedFrames::new(vec![], Some(armed_frame(region))));
        let capture = Arc::new(capture_loop(
            frames,
            SharedRegion::new(region),
            Arc::new(RecordingSink::default()),
            4000,
        ));
        let (tx, rx) = kanal::bounded(1);

        let handle = capture.spawn_acquire(77, tx).unwrap();
        let outcome = rx.recv().unwrap();
        handle.join().unwrap();

        assert_eq!(outcome.unwrap().threshold(), 77);
    }

    struct PanickingFrames;

    impl FrameSource for PanickingFrames {
        fn capture_frame(&self) -> Option<RgbaImage> {
            panic!("provider exploded")
        }
    }

    #[test]
    fn spawned_acquire_reports_panics() {
        let capture = Arc::new(CaptureLoop::new(
            Arc::new(PanickingFrames),
            Arc::new(SharedRegion::new(CaptureRegion::new(0, 0, 10, 10))),
            Arc::new(RecordingSink::default()),
            &config(4000),
        ));
        let (tx, rx) = kanal::bounded(1);

        let handle = capture.spawn_acquire(128, tx).unwrap();
        let outcome = rx.recv().unwrap();
        handle.join().unwrap();

        assert_eq!(
            outcome.unwrap_err(),
            CaptureError::Panicked("provider exploded".to_string())
        );
    }

    #[test]
    fn crop_is_clipped_to_frame() {
        let frame = contaminated_frame();
        let crop = crop_inside_border(&frame, CaptureRegion::new(80, -10, 40, 40), 2);
        assert_eq!((crop.width(), crop.height()), (18, 28));

        let none = crop_inside_border(&frame, CaptureRegion::new(200, 200, 40, 40), 2);
        assert_eq!((none.width(), none.height()), (0, 0));
    }
}
