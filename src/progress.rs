//! Progress reporting and cancellation.
//!
//! A [`ProgressCallback`] observes the capture loop; a
//! [`CancellationToken`] stops it between packets.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framedump::{ExtractOptions, FrameDump, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{} frames written", info.frames_written);
//!     }
//! }
//!
//! let dump = FrameDump::open("input.mp4")?;
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! dump.run(&options)?;
//! # Ok::<(), framedump::FrameDumpError>(())
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// A snapshot of capture progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames written to disk so far.
    pub frames_written: u64,
    /// Sequence number of the most recent frame.
    pub current_frame: u64,
    /// Expected frame count, when the container advertises one.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the capture started.
    pub elapsed: Duration,
}

/// Receives progress updates from the capture loop.
///
/// Callbacks observe only; use [`CancellationToken`] to stop a capture.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once when the capture ends.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation flag shared between clones.
///
/// ```
/// use framedump::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Batches progress notifications for the capture loop.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    batch_size: u64,
    written: u64,
    last_frame: u64,
    since_last_report: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: Option<u64>, batch_size: u64) -> Self {
        Self {
            callback,
            total,
            batch_size: batch_size.max(1),
            written: 0,
            last_frame: 0,
            since_last_report: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one written frame.
    pub(crate) fn advance(&mut self, sequence: u64) {
        self.written += 1;
        self.last_frame = sequence;
        self.since_last_report += 1;

        if self.since_last_report >= self.batch_size {
            self.report();
            self.since_last_report = 0;
        }
    }

    /// Emit a final report regardless of batching.
    pub(crate) fn finish(&mut self) {
        self.report();
    }

    fn report(&self) {
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.written as f32 / total as f32 * 100.0).min(100.0));

        self.callback.on_progress(&ProgressInfo {
            frames_written: self.written,
            current_frame: self.last_frame,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
        });
    }
}
