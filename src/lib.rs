//! # framedump
//!
//! Dump every decoded frame of a video to disk as a binary pixel map.
//!
//! `framedump` opens a media container with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), selects the first
//! video stream, decodes every packet of it, converts each frame to RGB24
//! and writes it as a `P6` file named `<prefix>-<N>.ppm`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framedump::{ExtractOptions, FrameDump};
//!
//! let dump = FrameDump::open("input.mp4")?;
//! let summary = dump.run(&ExtractOptions::new())?;
//! println!("{} frames written to assets/", summary.frames_written);
//! # Ok::<(), framedump::FrameDumpError>(())
//! ```
//!
//! ## Stages
//!
//! Each stage is usable on its own:
//!
//! - [`MediaSource`] opens the container and probes its streams.
//! - [`select_video_stream`] picks the first video stream.
//! - [`DecodingSession`] opens a decoder for it and implements the
//!   send/receive decode step.
//! - [`RgbFrame`] is the preallocated, row-aligned RGB24 buffer.
//! - [`RgbConverter`] converts decoded frames into it.
//! - [`write_ppm`] / [`PpmWriter`] write it to disk.
//! - [`capture`] runs the loop over any [`PacketSource`],
//!   [`FrameDecoder`], [`FrameConverter`] and [`FrameSink`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed. On Windows, point
//! `FFMPEG_DIR` at the installation (see `build.rs`).

pub mod capture;
pub mod config;
pub mod conversion;
pub mod decoder;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod source;
pub mod writer;

pub use capture::{CaptureSummary, capture};
pub use config::ExtractOptions;
pub use conversion::{FrameConverter, RgbConverter};
pub use decoder::{DecodeOutcome, DecodingSession, FrameDecoder};
pub use error::FrameDumpError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::RgbFrame;
pub use metadata::{MediaKind, MediaMetadata, StreamDescriptor, select_video_stream};
pub use pipeline::FrameDump;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use source::{MediaSource, PacketSource};
pub use writer::{FrameSink, PpmWriter, encode_ppm, frame_file_name, write_ppm};
