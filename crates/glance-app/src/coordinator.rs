use std::sync::Arc;
use std::time::{Duration, Instant};

use glance_capture::{CaptureError, CaptureLoop, CaptureOutcome, CapturedScreenshot, FrameSource};
use glance_config::Config;
use glance_core::{DiagnosticSink, threshold_from_position};
use glance_ocr::{
    EngineError, Job, RecognitionEngine, RecognitionOutcome, RecognitionWorker, WorkerEvent,
};
use glance_types::{BorderStyle, Notice, TextOrientation};
use kanal::{Receiver, Sender};

use crate::instant::InstantGate;
use crate::overlay::Overlay;

/// Builds a fresh engine each time the worker is (re)started
pub type EngineFactory = Box<dyn Fn() -> Result<Box<dyn RecognitionEngine>, EngineError>>;

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Failed to create recognition engine: {0}")]
    Engine(#[from] EngineError),

    #[error("Failed to start recognition worker: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    /// Long-press drag is choosing a threshold
    ThresholdPreview,
    /// Capture loop running in the background
    CapturePending,
    /// Job handed to the worker, busy indicator up
    RecognitionPending,
}

struct Settings {
    show_preview: bool,
    instant_mode: bool,
    min_size: u32,
    instant_size_multiplier: u32,
    idle_poll: Duration,
}

/// Gesture-driven state machine that owns the capture cache and the worker.
///
/// Every method runs on the UI thread. Capture outcomes and worker events
/// arrive through channels drained by [`pump`](Self::pump).
pub struct CaptureCoordinator<O: Overlay> {
    overlay: O,
    capture: Arc<CaptureLoop>,
    diagnostics: Arc<dyn DiagnosticSink>,
    new_engine: EngineFactory,
    worker: RecognitionWorker,
    worker_tx: Sender<WorkerEvent>,
    worker_rx: Receiver<WorkerEvent>,
    capture_tx: Sender<CaptureOutcome>,
    capture_rx: Receiver<CaptureOutcome>,
    screenshot: Option<CapturedScreenshot>,
    gate: InstantGate,
    settings: Settings,
    threshold: u8,
    in_long_press: bool,
    capture_pending: bool,
    /// Job whose events are still awaited; events for any other id are stale
    pending_job: Option<u64>,
    next_job: u64,
}

impl<O: Overlay> CaptureCoordinator<O> {
    pub fn new(
        overlay: O,
        frames: Arc<dyn FrameSource>,
        diagnostics: Arc<dyn DiagnosticSink>,
        new_engine: EngineFactory,
        config: &Config,
    ) -> Result<Self, CoordinatorError> {
        let capture = Arc::new(CaptureLoop::new(
            frames,
            Arc::new(overlay.region()),
            Arc::clone(&diagnostics),
            &config.capture,
        ));

        let (worker_tx, worker_rx) = kanal::unbounded();
        let (capture_tx, capture_rx) = kanal::unbounded();
        let worker = RecognitionWorker::spawn(
            new_engine()?,
            config.ocr.orientation,
            Arc::clone(&diagnostics),
            worker_tx.clone(),
        )?;

        tracing::info!(
            "[COORDINATOR] Ready (orientation: {:?}, preview: {}, instant: {})",
            config.ocr.orientation,
            config.ui.show_preview,
            config.ui.instant_mode
        );

        Ok(Self {
            overlay,
            capture,
            diagnostics,
            new_engine,
            worker,
            worker_tx,
            worker_rx,
            capture_tx,
            capture_rx,
            screenshot: None,
            gate: InstantGate::new(config.ui.double_tap_cooldown()),
            settings: Settings {
                show_preview: config.ui.show_preview,
                instant_mode: config.ui.instant_mode,
                min_size: config.ui.min_size,
                instant_size_multiplier: config.ui.instant_size_multiplier,
                idle_poll: config.ocr.idle_poll(),
            },
            threshold: config.capture.default_threshold,
            in_long_press: false,
            capture_pending: false,
            pending_job: None,
            next_job: 0,
        })
    }

    /// Restart the worker with new capture parameters
    pub fn reinit(
        &mut self,
        orientation: TextOrientation,
        show_preview: bool,
        instant_mode: bool,
    ) -> Result<(), CoordinatorError> {
        self.settings.show_preview = show_preview;
        self.settings.instant_mode = instant_mode;

        self.worker.stop();
        if self.pending_job.take().is_some() {
            self.overlay.hide_busy(false);
            self.overlay.set_border(BorderStyle::Armed);
        }

        let engine = (self.new_engine)()?;
        self.worker = RecognitionWorker::spawn(
            engine,
            orientation,
            Arc::clone(&self.diagnostics),
            self.worker_tx.clone(),
        )?;

        tracing::info!("[COORDINATOR] Worker restarted ({:?})", orientation);
        Ok(())
    }

    pub fn state(&self) -> CoordinatorState {
        if self.in_long_press {
            CoordinatorState::ThresholdPreview
        } else if self.capture_pending {
            CoordinatorState::CapturePending
        } else if self.pending_job.is_some() {
            CoordinatorState::RecognitionPending
        } else {
            CoordinatorState::Idle
        }
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn worker(&self) -> &RecognitionWorker {
        &self.worker
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn screenshot(&self) -> Option<&CapturedScreenshot> {
        self.screenshot.as_ref()
    }

    pub fn pointer_down(&mut self) {
        tracing::debug!("[GESTURE] Down");
        self.reset_box();
    }

    pub fn pointer_move(&mut self, x: f32) {
        tracing::debug!("[GESTURE] Move x={}", x);
        if !self.in_long_press && self.pending_job.is_none() {
            self.overlay.set_preview(None);
        }

        // Whatever was being recognized no longer matches the box
        self.worker.cancel();
        if self.in_long_press {
            self.preview_threshold(x);
        }
    }

    pub fn long_press(&mut self, x: f32) {
        tracing::debug!("[GESTURE] Long press x={}", x);
        self.in_long_press = true;
        self.preview_threshold(x);
    }

    pub fn pointer_up(&mut self) {
        tracing::debug!(
            "[GESTURE] Up (long press: {}, capturing: {}, pending job: {:?})",
            self.in_long_press,
            self.capture_pending,
            self.pending_job
        );

        if !self.in_long_press && !self.capture_pending && self.pending_job.is_none() {
            self.overlay.set_border(BorderStyle::Armed);
            self.start_capture();
        }

        self.in_long_press = false;
    }

    pub fn double_tap(&mut self) {
        self.double_tap_at(Instant::now());
    }

    pub(crate) fn double_tap_at(&mut self, now: Instant) {
        tracing::debug!("[GESTURE] Double tap");
        self.gate.record_double_tap(now);
        self.perform_recognition(false);
    }

    pub fn resize(&mut self) {
        tracing::debug!("[GESTURE] Resize");
        self.worker.cancel();
        self.overlay.set_preview(None);
        self.overlay.set_border(BorderStyle::Armed);
    }

    /// Handle everything delivered from background threads since the last
    /// call. Never blocks. Returns the number of messages handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;

        while let Ok(Some(outcome)) = self.capture_rx.try_recv() {
            self.on_capture(outcome, Instant::now());
            handled += 1;
        }

        while let Ok(Some(event)) = self.worker_rx.try_recv() {
            self.on_worker_event(event);
            handled += 1;
        }

        handled
    }

    pub(crate) fn on_capture(&mut self, outcome: CaptureOutcome, now: Instant) {
        self.capture_pending = false;

        let shot = match outcome {
            Ok(shot) => shot,
            Err(e) => {
                match &e {
                    CaptureError::NoFrameAvailable => tracing::warn!("[CAPTURE] {}", e),
                    _ => tracing::error!("[CAPTURE] {}", e),
                }
                self.overlay.notify(Notice::CaptureFailed(e.to_string()));
                return;
            }
        };

        let region = shot.region();
        let shot = self.screenshot.insert(shot);
        if self.settings.show_preview {
            self.overlay.set_preview(Some(shot.cached()));
        }

        if self.settings.instant_mode
            && self.gate.allows(now)
            && InstantGate::qualifies(
                region,
                self.settings.min_size,
                self.settings.instant_size_multiplier,
            )
        {
            self.perform_recognition(true);
        }
    }

    fn on_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Started { job, .. } if self.pending_job == Some(job) => {
                self.overlay.show_busy();
                self.overlay.set_border(BorderStyle::Default);
            }
            WorkerEvent::Finished { job, outcome } if self.pending_job == Some(job) => {
                self.on_finished(outcome);
            }
            WorkerEvent::Started { job, .. } | WorkerEvent::Finished { job, .. } => {
                tracing::debug!("[OCR] Ignoring event of superseded job {}", job);
            }
        }
    }

    fn on_finished(&mut self, outcome: RecognitionOutcome) {
        self.pending_job = None;
        self.overlay.hide_busy(outcome.instant());
        self.overlay.set_border(BorderStyle::Armed);

        match outcome {
            RecognitionOutcome::Recognized { result, crop } => {
                tracing::info!(
                    "[OCR] {} candidates in {:?}",
                    result.candidates.len(),
                    result.elapsed
                );
                self.overlay.show_result(result, crop);
            }
            RecognitionOutcome::NoTextFound { .. } => {
                tracing::info!("[OCR] No text found");
                self.overlay.notify(Notice::NoTextFound);
            }
            RecognitionOutcome::Failed {
                error: EngineError::Aborted,
                ..
            } => {
                tracing::debug!("[OCR] Aborted");
            }
            RecognitionOutcome::Failed { error, .. } => {
                tracing::error!("[OCR] {}", error);
                self.overlay
                    .notify(Notice::RecognitionFailed(error.to_string()));
            }
        }
    }

    /// Clear the shown image and re-arm the border, unless a threshold drag
    /// or a recognition owns the box right now
    fn reset_box(&mut self) {
        if !self.in_long_press && self.pending_job.is_none() {
            self.overlay.set_preview(None);
            self.overlay.set_border(BorderStyle::Armed);
        }
    }

    fn preview_threshold(&mut self, x: f32) {
        if !self.settings.show_preview {
            return;
        }
        let Some(shot) = self.screenshot.as_mut() else {
            return;
        };

        self.threshold = threshold_from_position(x, self.overlay.display_width());
        let image = shot.processed(self.threshold);
        self.overlay.set_preview(Some(image));
    }

    fn start_capture(&mut self) {
        self.capture_pending = true;
        if let Err(e) = self
            .capture
            .spawn_acquire(self.threshold, self.capture_tx.clone())
        {
            tracing::error!("[CAPTURE] Failed to start capture thread: {}", e);
            self.capture_pending = false;
            self.overlay.notify(Notice::CaptureFailed(e.to_string()));
        }
    }

    fn perform_recognition(&mut self, instant: bool) {
        let Some(shot) = self.screenshot.as_mut() else {
            tracing::debug!("[OCR] Nothing captured yet");
            self.overlay.notify(Notice::NothingCaptured);
            return;
        };

        if !instant {
            // Previous job must release the engine before it is reused
            self.worker.wait_until_idle(self.settings.idle_poll);
        }

        let image = if self.settings.show_preview {
            shot.cached()
        } else {
            Arc::clone(shot.crop())
        };
        let id = self.next_job;
        self.next_job += 1;
        let job = Job {
            id,
            image,
            crop: Arc::clone(shot.crop()),
            region: shot.region(),
            instant,
        };

        if self.worker.submit(job) {
            self.pending_job = Some(id);
        } else {
            tracing::warn!("[OCR] Worker stopped, job {} dropped", id);
        }
    }
}
