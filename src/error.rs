//! Error types for the `framedump` crate.
//!
//! [`FrameDumpError`] is the single error type returned by every fallible
//! stage of the pipeline. Variants carry the path, geometry or upstream
//! message needed to diagnose a failure without extra logging at the call
//! site.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// The unified error type for all `framedump` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameDumpError {
    /// The container could not be opened or is not a recognised format.
    #[error("Failed to open media file at {path}: {reason}")]
    Open {
        /// Path passed to [`MediaSource::open`](crate::MediaSource::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The container opened but its stream information could not be read.
    #[error("Failed to read stream information from {path}: {reason}")]
    StreamProbe {
        /// Path of the opened container.
        path: PathBuf,
        /// Underlying reason the probe failed.
        reason: String,
    },

    /// The container has no video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// No decoder is registered for the selected stream's codec.
    #[error("No decoder available for codec '{codec}'")]
    UnsupportedCodec {
        /// Name of the codec the stream declares.
        codec: String,
    },

    /// The decoding session could not be opened.
    #[error("Failed to open video decoder: {0}")]
    DecoderOpen(String),

    /// The RGB24 frame buffer could not be allocated.
    #[error("Failed to allocate {width}x{height} RGB24 frame buffer: {reason}")]
    Allocation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
        /// Why the allocation was refused.
        reason: String,
    },

    /// A packet could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    Decode(String),

    /// A decoded frame could not be converted to RGB24.
    #[error("Failed to convert frame to RGB24: {0}")]
    Conversion(String),

    /// A frame file could not be created or written.
    #[error("Failed to write frame to {path}: {source}")]
    FileWrite {
        /// Destination that failed.
        path: PathBuf,
        /// The I/O error reported by the operating system.
        #[source]
        source: IoError,
    },

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl FrameDumpError {
    /// Returns `true` for errors raised while frames were being decoded or
    /// converted. Frames written before such an error are complete and stay
    /// on disk.
    pub fn is_mid_stream(&self) -> bool {
        matches!(self, FrameDumpError::Decode(_) | FrameDumpError::Conversion(_))
    }
}
