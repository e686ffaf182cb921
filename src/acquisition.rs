//! # Acquisition Loop
//!
//! The producer half of the pipeline. A dedicated thread owns the frame
//! source from open to drop: it reads, normalizes and publishes frames
//! into the [`LatestFrame`] slot as fast as the source delivers them.
//!
//! ## Startup handshake
//!
//! The thread opens the source and reads, converts and publishes the first
//! frame before [`spawn_acquisition`] returns. The first frame's size is
//! sent back so the display image can be created with it. If opening or
//! the first read fails, the error is returned instead and the thread has
//! already finished.
//!
//! ## Failure policy
//!
//! - End of stream or a read error is fatal: the loop ends, the fatal
//!   handler runs, nothing is retried.
//! - A frame whose size differs from the first frame is skipped.
//! - A failure that happens after the run flag was cleared is a normal stop.

use std::sync::{Arc, mpsc};

use log::{debug, error, info, trace, warn};

use crate::capture::{FrameSource, SourceOpener};
use crate::core::buffer_pool::BufferPool;
use crate::core::frame::{NormalizedFrame, Size};
use crate::core::join_on_drop::{JoinOnDrop, spawn_named};
use crate::core::latest_frame::{LatestFrame, PublishOutcome};
use crate::core::run_flag::RunFlag;
use crate::error::{CaptureError, CaptureResult, classify};
use crate::processing::convert_into;

const THREAD_NAME: &str = "acquisition";

/// Invoked on the acquisition thread when acquisition fails for good.
pub type FatalHandler = Arc<dyn Fn(&CaptureError) + Send + Sync>;

/// Prints the diagnostic and exits the process with the error's exit code.
pub fn exit_process_handler() -> FatalHandler {
    Arc::new(|error: &CaptureError| {
        crate::eprintln_and_exit!(*error);
    })
}

/// Only logs; the failure is still returned from [`AcquisitionHandle::join`].
pub fn log_only_handler() -> FatalHandler {
    Arc::new(|error: &CaptureError| {
        error!("acquisition stopped: {}", error);
    })
}

/// Counters kept by the acquisition thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Frames returned by the source, the first one included
    pub frames_read: u64,
    /// Frames stored in the latest-frame slot
    pub published: u64,
    /// Frames dropped (wrong size or unusable)
    pub skipped: u64,
}

struct Worker {
    latest: Arc<LatestFrame>,
    run_flag: RunFlag,
    pool: Arc<BufferPool>,
    on_fatal: FatalHandler,
    stats: AcquisitionStats,
}

impl Worker {
    fn startup(&mut self, opener: SourceOpener) -> CaptureResult<(Box<dyn FrameSource>, Size)> {
        let mut source = opener()?;
        source.watch_run_flag(&self.run_flag);
        info!("opened {}", source.describe());

        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Err(CaptureError::end_of_stream(0)),
            Err(e) => return Err(as_acquisition_failure(e)),
        };
        self.stats.frames_read += 1;
        let size = frame.size();
        let normalized = convert_into(&frame, self.pool.get_buffer(frame_len(size)))?;
        self.publish(normalized);
        Ok((source, size))
    }

    fn run(
        mut self,
        mut source: Box<dyn FrameSource>,
        size: Size,
    ) -> CaptureResult<AcquisitionStats> {
        while self.run_flag.is_running() {
            let frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    let frames_read = self.stats.frames_read;
                    return self.fail(CaptureError::end_of_stream(frames_read));
                }
                Err(e) => return self.fail(as_acquisition_failure(e)),
            };
            self.stats.frames_read += 1;

            if frame.size() != size {
                let mismatch = CaptureError::dimension_mismatch(size, frame.size());
                warn!("{}; frame skipped", mismatch);
                self.stats.skipped += 1;
                continue;
            }

            let buffer = self.pool.get_buffer(frame_len(size));
            let normalized = match convert_into(&frame, buffer) {
                Ok(normalized) => normalized,
                Err(e) if classify::skips_frame(&e) => {
                    warn!("{}; frame skipped", e);
                    self.stats.skipped += 1;
                    continue;
                }
                Err(e) => return self.fail(e),
            };
            if !self.publish(normalized) {
                break;
            }
        }
        debug!("acquisition loop finished: {:?}", self.stats);
        Ok(self.stats)
    }

    /// Returns false once the slot refuses frames.
    fn publish(&mut self, frame: NormalizedFrame) -> bool {
        match self.latest.publish(frame) {
            PublishOutcome::Stored {
                sequence,
                displaced,
            } => {
                self.stats.published += 1;
                trace!("published frame {}", sequence);
                if let Some(old) = displaced {
                    self.pool.return_buffer(old.into_bytes());
                }
                true
            }
            PublishOutcome::Rejected(frame) => {
                debug!("latest-frame slot closed; frame discarded");
                self.pool.return_buffer(frame.into_bytes());
                false
            }
        }
    }

    fn fail(self, error: CaptureError) -> CaptureResult<AcquisitionStats> {
        if !self.run_flag.is_running() {
            debug!("source ended during shutdown: {}", error);
            return Ok(self.stats);
        }
        error!("{}", error);
        (self.on_fatal)(&error);
        Err(error)
    }
}

fn frame_len(size: Size) -> usize {
    size.pixel_count() * 3
}

fn as_acquisition_failure(error: CaptureError) -> CaptureError {
    if error.is_acquisition_failure() {
        error
    } else {
        CaptureError::frame_capture(error.to_string())
    }
}

/// Starts the acquisition thread and waits for the startup handshake.
pub fn spawn_acquisition(
    opener: SourceOpener,
    latest: Arc<LatestFrame>,
    run_flag: RunFlag,
    pool: Arc<BufferPool>,
    on_fatal: FatalHandler,
) -> CaptureResult<AcquisitionHandle> {
    let (ready_tx, ready_rx) = mpsc::sync_channel::<CaptureResult<Size>>(1);
    let mut worker = Worker {
        latest,
        run_flag: run_flag.clone(),
        pool,
        on_fatal,
        stats: AcquisitionStats::default(),
    };

    let thread = spawn_named(THREAD_NAME, move || {
        let (source, size) = match worker.startup(opener) {
            Ok(started) => started,
            Err(e) => {
                // The caller reports this one; the handler is for failures
                // after startup.
                _ = ready_tx.send(Err(e));
                return Ok(worker.stats);
            }
        };
        _ = ready_tx.send(Ok(size));
        worker.run(source, size)
    })?;

    match ready_rx.recv() {
        Ok(Ok(size)) => {
            info!("first frame {}; acquisition running", size);
            Ok(AcquisitionHandle {
                thread: Some(thread),
                run_flag,
                first_frame_size: size,
            })
        }
        Ok(Err(e)) => {
            _ = thread.join();
            Err(e)
        }
        // The thread dropped the sender without reporting: it panicked.
        Err(_) => {
            _ = thread.join();
            Err(CaptureError::state(
                "starting",
                "spawn_acquisition",
                "acquisition thread panicked during startup",
            ))
        }
    }
}

/// Owner of a running acquisition thread.
///
/// Dropping the handle clears the run flag and joins the thread.
pub struct AcquisitionHandle {
    thread: Option<JoinOnDrop<CaptureResult<AcquisitionStats>>>,
    run_flag: RunFlag,
    first_frame_size: Size,
}

impl AcquisitionHandle {
    /// Size of the frame read during startup; every later frame must match.
    pub fn first_frame_size(&self) -> Size {
        self.first_frame_size
    }

    /// Asks the loop to stop after its current iteration. Returns true for
    /// the call that actually cleared the flag.
    pub fn stop(&self) -> bool {
        self.run_flag.stop()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinOnDrop::is_finished)
    }

    /// Waits for the thread. Does not stop it; call [`Self::stop`] first.
    pub fn join(mut self) -> CaptureResult<AcquisitionStats> {
        let Some(thread) = self.thread.take() else {
            return Err(CaptureError::state(
                "joined",
                "join",
                "acquisition thread already joined",
            ));
        };
        thread.join().map_err(|_| {
            CaptureError::state("running", "join", "acquisition thread panicked")
        })?
    }
}

impl Drop for AcquisitionHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.run_flag.stop();
        }
    }
}
