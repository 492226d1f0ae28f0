//! The [`FrameDump`] pipeline.
//!
//! `FrameDump` ties the stages together: it opens the container, selects
//! the first video stream and opens one decoding session for it. A call to
//! [`run`](FrameDump::run) then allocates the RGB24 buffer at the decoder's
//! geometry and drives the capture loop into numbered `P6` files.
//!
//! ```no_run
//! use framedump::{ExtractOptions, FrameDump};
//!
//! let dump = FrameDump::open("input.mp4")?;
//! let summary = dump.run(&ExtractOptions::new().with_output_dir("frames"))?;
//! println!("wrote {} frames", summary.frames_written);
//! # Ok::<(), framedump::FrameDumpError>(())
//! ```

use std::path::Path;

use crate::{
    capture::{CaptureSummary, capture},
    config::ExtractOptions,
    conversion::RgbConverter,
    decoder::DecodingSession,
    error::FrameDumpError,
    frame::RgbFrame,
    metadata::{MediaMetadata, StreamDescriptor},
    source::MediaSource,
    writer::PpmWriter,
};

/// An opened container together with the decoding session for its first
/// video stream.
///
/// Both are released when the value is dropped.
#[derive(Debug)]
pub struct FrameDump {
    // Declared first so the decoder closes before the demuxer.
    session: DecodingSession,
    source: MediaSource,
    metadata: MediaMetadata,
    video: StreamDescriptor,
}

impl FrameDump {
    /// Open `path`, select its first video stream and open a decoder for it.
    ///
    /// # Errors
    ///
    /// - [`FrameDumpError::Open`] / [`FrameDumpError::StreamProbe`] from the
    ///   container.
    /// - [`FrameDumpError::NoVideoStream`] if the container carries no video.
    /// - [`FrameDumpError::UnsupportedCodec`] / [`FrameDumpError::DecoderOpen`]
    ///   from decoder setup.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameDumpError> {
        let source = MediaSource::open(path)?;
        let metadata = source.metadata();

        let Some(video) = metadata.video().cloned() else {
            log::debug!("{} has no video stream", source.path().display());
            return Err(FrameDumpError::NoVideoStream);
        };
        log::debug!("Selected video stream {}", video.index);

        let session = DecodingSession::open(&source, video.index)?;

        Ok(Self {
            session,
            source,
            metadata,
            video,
        })
    }

    /// Container metadata captured at open time.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Descriptor of the stream frames are extracted from.
    pub fn video_stream(&self) -> &StreamDescriptor {
        &self.video
    }

    /// The decoding session.
    pub fn session(&self) -> &DecodingSession {
        &self.session
    }

    /// Decode every frame of the video stream and write it to
    /// `<output_dir>/<prefix>-<N>.ppm`, N starting at 1.
    ///
    /// Consumes the pipeline: the container and decoder are released when
    /// the capture returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`FrameDumpError::Allocation`] if the RGB24 buffer cannot be
    ///   allocated at the decoder's geometry.
    /// - Any error documented on [`capture`](crate::capture::capture).
    pub fn run(mut self, options: &ExtractOptions) -> Result<CaptureSummary, FrameDumpError> {
        let mut target = RgbFrame::allocate(self.session.width(), self.session.height())?;
        let mut converter = RgbConverter::new();
        let mut sink = PpmWriter::new(options.output_dir(), options.prefix());
        let expected_frames = Some(self.video.frame_count);

        log::debug!("Writing frames to {}", options.output_dir().display());

        capture(
            &mut self.source,
            &mut self.session,
            &mut converter,
            &mut sink,
            &mut target,
            options,
            expected_frames,
        )
    }
}
