//! Video decoding session.
//!
//! [`DecodingSession`] binds one opened FFmpeg video decoder to the stream
//! selected from a [`MediaSource`]. Decoding follows FFmpeg's send/receive
//! model: [`submit`](FrameDecoder::submit) one packet, then call
//! [`receive`](FrameDecoder::receive) until it reports
//! [`DecodeOutcome::NoFrameYet`] or [`DecodeOutcome::EndOfStream`].

use std::fmt::{Debug, Formatter, Result as FmtResult};

use ffmpeg_next::{
    Error as FfmpegError, Packet, codec::decoder, format::Pixel, frame::Video as VideoFrame,
    util::error::EAGAIN,
};

use crate::{error::FrameDumpError, source::MediaSource};

/// Result of asking the decoder for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A decoded frame was written into the caller's frame slot.
    FrameProduced,
    /// The decoder needs more input before it can emit another frame.
    NoFrameYet,
    /// The decoder has been flushed and will emit no more frames.
    EndOfStream,
}

/// The packet decode step, as seen by the capture loop.
pub trait FrameDecoder {
    /// Index of the stream whose packets this decoder accepts.
    fn stream_index(&self) -> usize;

    /// Feed one compressed packet.
    fn submit(&mut self, packet: &Packet) -> Result<(), FrameDumpError>;

    /// Signal end of input so buffered frames can be drained.
    fn finish(&mut self) -> Result<(), FrameDumpError>;

    /// Pull the next decoded frame into `frame`, overwriting it.
    fn receive(&mut self, frame: &mut VideoFrame) -> Result<DecodeOutcome, FrameDumpError>;
}

/// An opened decoder bound to one video stream.
///
/// Released when dropped.
pub struct DecodingSession {
    decoder: decoder::Video,
    stream_index: usize,
    codec_name: String,
}

impl Debug for DecodingSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DecodingSession")
            .field("stream_index", &self.stream_index)
            .field("codec", &self.codec_name)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("pixel_format", &self.pixel_format())
            .finish()
    }
}

impl DecodingSession {
    /// Resolve and open a decoder for the stream at `stream_index`.
    ///
    /// # Errors
    ///
    /// - [`FrameDumpError::UnsupportedCodec`] if no decoder is registered for
    ///   the stream's codec.
    /// - [`FrameDumpError::DecoderOpen`] if the stream does not exist, its
    ///   parameters cannot be copied, or the decoder refuses to open.
    pub fn open(source: &MediaSource, stream_index: usize) -> Result<Self, FrameDumpError> {
        let context = source
            .codec_context(stream_index)
            .ok_or_else(|| {
                FrameDumpError::DecoderOpen(format!("stream {stream_index} does not exist"))
            })?
            .map_err(|error| {
                FrameDumpError::DecoderOpen(format!(
                    "failed to copy codec parameters for stream {stream_index}: {error}"
                ))
            })?;

        let codec_id = context.id();
        let codec = decoder::find(codec_id).ok_or_else(|| FrameDumpError::UnsupportedCodec {
            codec: codec_id.name().to_string(),
        })?;
        let codec_name = codec.name().to_string();

        let decoder = context
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.video())
            .map_err(|error| {
                FrameDumpError::DecoderOpen(format!("{codec_name} (stream {stream_index}): {error}"))
            })?;

        log::debug!(
            "Opened {} decoder for stream {} ({}x{}, {:?})",
            codec_name,
            stream_index,
            decoder.width(),
            decoder.height(),
            decoder.format(),
        );

        Ok(Self {
            decoder,
            stream_index,
            codec_name,
        })
    }

    /// Frame width resolved by the decoder.
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /// Frame height resolved by the decoder.
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /// Native pixel format of decoded frames.
    pub fn pixel_format(&self) -> Pixel {
        self.decoder.format()
    }

    /// Name of the decoder implementation.
    pub fn codec_name(&self) -> &str {
        &self.codec_name
    }
}

impl FrameDecoder for DecodingSession {
    fn stream_index(&self) -> usize {
        self.stream_index
    }

    fn submit(&mut self, packet: &Packet) -> Result<(), FrameDumpError> {
        self.decoder.send_packet(packet).map_err(|error| {
            FrameDumpError::Decode(format!("failed to send packet to decoder: {error}"))
        })
    }

    fn finish(&mut self) -> Result<(), FrameDumpError> {
        self.decoder.send_eof().map_err(|error| {
            FrameDumpError::Decode(format!("failed to flush decoder: {error}"))
        })
    }

    fn receive(&mut self, frame: &mut VideoFrame) -> Result<DecodeOutcome, FrameDumpError> {
        classify_receive(self.decoder.receive_frame(frame))
    }
}

/// Map FFmpeg's receive status onto [`DecodeOutcome`]. EAGAIN and EOF are
/// normal terminal conditions for one drain; anything else is a decode error.
fn classify_receive(status: Result<(), FfmpegError>) -> Result<DecodeOutcome, FrameDumpError> {
    match status {
        Ok(()) => Ok(DecodeOutcome::FrameProduced),
        Err(FfmpegError::Other { errno }) if errno == EAGAIN => Ok(DecodeOutcome::NoFrameYet),
        Err(FfmpegError::Eof) => Ok(DecodeOutcome::EndOfStream),
        Err(error) => Err(FrameDumpError::Decode(format!(
            "failed to receive frame from decoder: {error}"
        ))),
    }
}
