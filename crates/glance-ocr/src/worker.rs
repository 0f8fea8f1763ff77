use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use glance_core::{DiagnosticSink, panic_message};
use glance_types::{RecognitionResult, TextOrientation};
use kanal::Sender;
use parking_lot::{Condvar, Mutex};

use crate::engine::{AbortHandle, RecognitionEngine, symbols_to_candidates};
use crate::error::EngineError;
use crate::job::{Job, RecognitionOutcome, WorkerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Running,
    Stopped,
}

/// Single-slot mailbox plus lifecycle, always accessed under one lock
struct Mailbox {
    job: Option<Job>,
    lifecycle: Lifecycle,
}

struct Shared {
    mailbox: Mutex<Mailbox>,
    wake: Condvar,
    busy: AtomicBool,
    abort: Arc<dyn AbortHandle>,
}

/// Owns the recognition thread. Newest submission wins; there is no queue.
pub struct RecognitionWorker {
    shared: Arc<Shared>,
    orientation: TextOrientation,
    handle: Option<JoinHandle<()>>,
}

impl RecognitionWorker {
    pub fn spawn(
        mut engine: Box<dyn RecognitionEngine>,
        orientation: TextOrientation,
        diagnostics: Arc<dyn DiagnosticSink>,
        events: Sender<WorkerEvent>,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            mailbox: Mutex::new(Mailbox {
                job: None,
                lifecycle: Lifecycle::Created,
            }),
            wake: Condvar::new(),
            busy: AtomicBool::new(false),
            abort: engine.abort_handle(),
        });

        engine.set_orientation(orientation);

        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name(format!("glance-ocr-{orientation:?}").to_lowercase())
            .spawn(move || run(thread_shared, engine, diagnostics, events))?;

        Ok(Self {
            shared,
            orientation,
            handle: Some(handle),
        })
    }

    pub fn orientation(&self) -> TextOrientation {
        self.orientation
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.mailbox.lock().lifecycle
    }

    /// A job has been taken from the mailbox and is not finished yet
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::SeqCst)
    }

    /// Replace any pending job with `job` and wake the thread.
    /// Returns `false` once the worker is stopped.
    pub fn submit(&self, job: Job) -> bool {
        let mut mailbox = self.shared.mailbox.lock();
        if mailbox.lifecycle == Lifecycle::Stopped {
            tracing::debug!("[WORKER] Stopped, ignoring job");
            return false;
        }

        self.shared.abort.abort();
        if mailbox.job.replace(job).is_some() {
            tracing::debug!("[WORKER] Replaced pending job");
        }
        self.shared.wake.notify_one();
        tracing::debug!("[WORKER] Notified");
        true
    }

    /// Best-effort abort of the call in progress. A result that was already
    /// completing may still be delivered.
    pub fn cancel(&self) {
        // Same lock the worker holds while handing a job to the engine, so
        // the abort lands on the job that is running now
        let _mailbox = self.shared.mailbox.lock();
        self.shared.abort.abort();
        tracing::debug!("[WORKER] Cancel requested");
    }

    /// Blocks, cancelling every `poll`, until no job is in flight
    pub fn wait_until_idle(&self, poll: Duration) {
        while self.is_busy() {
            self.cancel();
            std::thread::sleep(poll);
        }
    }

    /// Drop any pending job and let the thread exit. Idempotent.
    pub fn stop(&self) {
        let mut mailbox = self.shared.mailbox.lock();
        mailbox.lifecycle = Lifecycle::Stopped;
        mailbox.job = None;
        self.shared.abort.abort();
        self.shared.wake.notify_all();
    }

    /// Stop and wait for the thread to exit
    pub fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("[WORKER] Thread panicked during shutdown");
            }
        }
    }
}

impl Drop for RecognitionWorker {
    fn drop(&mut self) {
        // The thread may be stuck inside the engine; do not wait for it here.
        self.stop();
    }
}

fn run(
    shared: Arc<Shared>,
    mut engine: Box<dyn RecognitionEngine>,
    diagnostics: Arc<dyn DiagnosticSink>,
    events: Sender<WorkerEvent>,
) {
    {
        let mut mailbox = shared.mailbox.lock();
        if mailbox.lifecycle == Lifecycle::Stopped {
            return;
        }
        mailbox.lifecycle = Lifecycle::Running;
    }
    tracing::info!("[WORKER] Running");

    loop {
        let (job, prepared) = {
            let mut mailbox = shared.mailbox.lock();
            while mailbox.job.is_none() && mailbox.lifecycle != Lifecycle::Stopped {
                tracing::debug!("[WORKER] Waiting");
                shared.wake.wait(&mut mailbox);
            }
            if mailbox.lifecycle == Lifecycle::Stopped {
                break;
            }
            let Some(job) = mailbox.job.take() else {
                continue;
            };
            shared.busy.store(true, Ordering::SeqCst);

            // Engines drop stale aborts here. Any cancel after this point
            // has to wait for the lock and so hits this job.
            let prepared = catch_unwind(AssertUnwindSafe(|| engine.set_image(&job.image)));
            (job, prepared)
        };

        let outcome = match prepared {
            Ok(()) => catch_unwind(AssertUnwindSafe(|| {
                process(engine.as_mut(), &job, diagnostics.as_ref(), &events)
            }))
            .unwrap_or_else(|payload| panicked(&job, payload.as_ref())),
            Err(payload) => panicked(&job, payload.as_ref()),
        };
        shared.busy.store(false, Ordering::SeqCst);

        let finished = WorkerEvent::Finished {
            job: job.id,
            outcome,
        };
        if events.send(finished).is_err() {
            tracing::debug!("[WORKER] Event receiver gone");
        }
    }

    tracing::info!("[WORKER] Stopped");
}

fn panicked(job: &Job, payload: &(dyn std::any::Any + Send)) -> RecognitionOutcome {
    let message = panic_message(payload);
    tracing::error!("[WORKER] Job {} panicked: {}", job.id, message);
    RecognitionOutcome::Failed {
        instant: job.instant,
        error: EngineError::Panicked(message),
    }
}

/// Runs with the job's image already handed to the engine
fn process(
    engine: &mut dyn RecognitionEngine,
    job: &Job,
    diagnostics: &dyn DiagnosticSink,
    events: &Sender<WorkerEvent>,
) -> RecognitionOutcome {
    let start = Instant::now();
    diagnostics.save(&job.image, "screen");

    if events
        .send(WorkerEvent::Started {
            job: job.id,
            instant: job.instant,
        })
        .is_err()
    {
        tracing::debug!("[WORKER] Event receiver gone");
    }

    let symbols = catch_unwind(AssertUnwindSafe(|| engine.recognize_symbols()))
        .unwrap_or_else(|payload| Err(EngineError::Panicked(panic_message(payload.as_ref()))));
    engine.reset();

    let symbols = match symbols {
        Ok(symbols) => symbols,
        Err(EngineError::Aborted) => {
            tracing::debug!("[WORKER] Job {} aborted after {:?}", job.id, start.elapsed());
            return RecognitionOutcome::Failed {
                instant: job.instant,
                error: EngineError::Aborted,
            };
        }
        Err(error) => {
            tracing::error!("[WORKER] Job {}: {}", job.id, error);
            return RecognitionOutcome::Failed {
                instant: job.instant,
                error,
            };
        }
    };

    let candidates = symbols_to_candidates(symbols);
    let elapsed = start.elapsed();
    tracing::debug!(
        "[WORKER] {} candidates in {:?}",
        candidates.len(),
        elapsed
    );

    if candidates.is_empty() {
        return RecognitionOutcome::NoTextFound {
            region: job.region,
            instant: job.instant,
        };
    }

    RecognitionOutcome::Recognized {
        result: RecognitionResult {
            candidates,
            elapsed,
            region: job.region,
            instant: job.instant,
        },
        crop: Arc::clone(&job.crop),
    }
}
