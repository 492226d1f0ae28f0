//! Stream descriptors and container metadata.
//!
//! Descriptors are owned snapshots taken when the container is opened, so
//! they stay valid independently of the demuxer that produced them.

use std::time::Duration;

use ffmpeg_next::{format::stream::Stream, media::Type};

/// Media kind of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Video track.
    Video,
    /// Audio track.
    Audio,
    /// Subtitle track.
    Subtitle,
    /// Opaque data track (timecodes, telemetry, ...).
    Data,
    /// Attachment (fonts, cover art).
    Attachment,
    /// Anything FFmpeg could not classify.
    Unknown,
}

impl From<Type> for MediaKind {
    fn from(medium: Type) -> Self {
        match medium {
            Type::Video => MediaKind::Video,
            Type::Audio => MediaKind::Audio,
            Type::Subtitle => MediaKind::Subtitle,
            Type::Data => MediaKind::Data,
            Type::Attachment => MediaKind::Attachment,
            Type::Unknown => MediaKind::Unknown,
        }
    }
}

/// Read-only description of one stream inside a container.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Index of the stream within the container.
    pub index: usize,
    /// Media kind.
    pub kind: MediaKind,
    /// Codec name as declared by the container (e.g. `"h264"`).
    pub codec: String,
    /// Coded width in pixels. Zero for non-video streams or when unknown.
    pub width: u32,
    /// Coded height in pixels. Zero for non-video streams or when unknown.
    pub height: u32,
    /// Average frame rate, or `0.0` when the container does not say.
    pub frames_per_second: f64,
    /// Frame count from the container index, or estimated from the
    /// duration and frame rate. Zero when neither is available.
    pub frame_count: u64,
}

impl StreamDescriptor {
    /// Snapshot a demuxer stream. `container_duration` is used to estimate
    /// the frame count when the stream does not carry one.
    pub(crate) fn from_stream(stream: &Stream<'_>, container_duration: Duration) -> Self {
        let parameters = stream.parameters();
        let kind = MediaKind::from(parameters.medium());
        let codec = match parameters.id().name() {
            "" => "unknown".to_string(),
            name => name.to_string(),
        };

        let (width, height) = if kind == MediaKind::Video {
            // SAFETY: `parameters` wraps a live AVCodecParameters owned by the
            // stream; only plain integer fields are read.
            let raw = unsafe { &*parameters.as_ptr() };
            (raw.width.max(0) as u32, raw.height.max(0) as u32)
        } else {
            (0, 0)
        };

        let rate = stream.avg_frame_rate();
        let frames_per_second = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if kind == MediaKind::Video && frames_per_second > 0.0 {
            (container_duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        Self {
            index: stream.index(),
            kind,
            codec,
            width,
            height,
            frames_per_second,
            frame_count,
        }
    }

    /// Returns `true` if this is a video stream.
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Return the index of the first video stream, scanning in index order.
///
/// `None` is a normal outcome: audio-only containers are valid input. When
/// several video streams exist the first one wins.
pub fn select_video_stream(streams: &[StreamDescriptor]) -> Option<usize> {
    streams
        .iter()
        .find(|stream| stream.is_video())
        .map(|stream| stream.index)
}

/// Container-level metadata collected at open time.
#[derive(Debug, Clone)]
pub struct MediaMetadata {
    /// Demuxer name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
    /// Container duration, or zero when unknown.
    pub duration: Duration,
    /// All streams, in index order.
    pub streams: Vec<StreamDescriptor>,
    /// Index of the stream frames are extracted from.
    pub video_stream_index: Option<usize>,
}

impl MediaMetadata {
    /// Descriptor of the selected video stream.
    pub fn video(&self) -> Option<&StreamDescriptor> {
        let index = self.video_stream_index?;
        self.streams.iter().find(|stream| stream.index == index)
    }
}
