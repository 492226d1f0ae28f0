//! Capture configuration.
//!
//! [`ExtractOptions`] is a builder carrying the output location, progress
//! and cancellation hooks, and the write-failure escalation policy.
//!
//! # Example
//!
//! ```
//! use framedump::{CancellationToken, ExtractOptions};
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_output_dir("frames")
//!     .with_prefix("shot")
//!     .with_cancellation(token.clone())
//!     .with_max_consecutive_write_failures(None);
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "assets";

/// Default file name prefix.
pub const DEFAULT_PREFIX: &str = "frame";

/// Consecutive write failures tolerated before a capture is aborted.
pub const DEFAULT_MAX_CONSECUTIVE_WRITE_FAILURES: u32 = 10;

/// Settings for one capture run.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) output_dir: PathBuf,
    pub(crate) prefix: String,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) max_consecutive_write_failures: Option<u32>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("output_dir", &self.output_dir)
            .field("prefix", &self.prefix)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field(
                "max_consecutive_write_failures",
                &self.max_consecutive_write_failures,
            )
            .finish()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Defaults: `assets/frame-<N>.ppm`, no progress callback, no
    /// cancellation, batch size 1, abort after 10 consecutive write failures.
    pub fn new() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            prefix: DEFAULT_PREFIX.to_string(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            max_consecutive_write_failures: Some(DEFAULT_MAX_CONSECUTIVE_WRITE_FAILURES),
        }
    }

    /// Directory frames are written into. It must already exist.
    #[must_use]
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.output_dir = directory.into();
        self
    }

    /// File name prefix, `frame` by default.
    #[must_use]
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked once per packet.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Fire the progress callback every `size` frames. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Abort after `limit` consecutive failed writes. `None` (or `Some(0)`)
    /// keeps going no matter how many writes fail.
    #[must_use]
    pub fn with_max_consecutive_write_failures(mut self, limit: Option<u32>) -> Self {
        self.max_consecutive_write_failures = limit.filter(|&limit| limit > 0);
        self
    }

    /// Directory frames are written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
