//! Opening media containers and reading packets.
//!
//! [`MediaSource`] owns the FFmpeg demuxer context. Opening and stream
//! probing are performed as two separate steps so that an unreadable file
//! ([`FrameDumpError::Open`]) can be told apart from a file whose streams
//! cannot be identified ([`FrameDumpError::StreamProbe`]).

use std::{
    ffi::CString,
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    ptr,
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, codec::context::Context as CodecContext, format::context::Input,
};
use ffmpeg_sys_next::{AVFormatContext, avformat_find_stream_info, avformat_open_input};

use crate::{
    error::FrameDumpError,
    metadata::{MediaMetadata, StreamDescriptor, select_video_stream},
};

/// A source of demuxed packets.
///
/// Implemented by [`MediaSource`]; the capture loop only depends on this
/// trait.
pub trait PacketSource {
    /// Read the next packet, or `None` once the input is exhausted.
    fn next_packet(&mut self) -> Result<Option<Packet>, FrameDumpError>;
}

/// An opened media container.
///
/// The demuxer context is closed when the value is dropped.
pub struct MediaSource {
    input: Input,
    path: PathBuf,
    streams: Vec<StreamDescriptor>,
}

impl Debug for MediaSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaSource")
            .field("path", &self.path)
            .field("streams", &self.streams)
            .finish_non_exhaustive()
    }
}

impl MediaSource {
    /// Open a container and probe its streams.
    ///
    /// # Errors
    ///
    /// - [`FrameDumpError::Open`] if the path cannot be opened or is not a
    ///   recognised container.
    /// - [`FrameDumpError::StreamProbe`] if stream information cannot be
    ///   determined.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameDumpError> {
        let path = path.as_ref().to_path_buf();

        log::debug!("Opening media source: {}", path.display());

        ffmpeg_next::init().map_err(|error| FrameDumpError::Open {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let c_path = path_to_c_string(&path).map_err(|reason| FrameDumpError::Open {
            path: path.clone(),
            reason,
        })?;

        // SAFETY: `avformat_open_input` either fills `context` with a fully
        // allocated demuxer or frees it and reports failure. On success the
        // pointer is handed to `Input`, whose destructor closes it, so the
        // probe failure path below releases it by dropping `input`.
        let input = unsafe {
            let mut context: *mut AVFormatContext = ptr::null_mut();
            let status = avformat_open_input(
                &mut context,
                c_path.as_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
            );
            if status != 0 {
                return Err(FrameDumpError::Open {
                    path,
                    reason: FfmpegError::from(status).to_string(),
                });
            }

            let input = Input::wrap(context);
            let status = avformat_find_stream_info(context, ptr::null_mut());
            if status < 0 {
                return Err(FrameDumpError::StreamProbe {
                    path,
                    reason: FfmpegError::from(status).to_string(),
                });
            }
            input
        };

        let duration = container_duration(&input);
        let streams: Vec<StreamDescriptor> = input
            .streams()
            .map(|stream| StreamDescriptor::from_stream(&stream, duration))
            .collect();

        log::debug!(
            "Opened {} ({} streams, format {})",
            path.display(),
            streams.len(),
            input.format().name(),
        );

        Ok(Self {
            input,
            path,
            streams,
        })
    }

    /// Path the container was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Demuxer name.
    pub fn format_name(&self) -> String {
        self.input.format().name().to_string()
    }

    /// All stream descriptors, in index order.
    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    /// Index of the first video stream, if any.
    pub fn video_stream(&self) -> Option<usize> {
        select_video_stream(&self.streams)
    }

    /// Snapshot of the container metadata.
    pub fn metadata(&self) -> MediaMetadata {
        MediaMetadata {
            format: self.format_name(),
            duration: container_duration(&self.input),
            streams: self.streams.clone(),
            video_stream_index: self.video_stream(),
        }
    }

    /// Fresh codec context carrying the parameters of the stream at `index`.
    pub(crate) fn codec_context(&self, index: usize) -> Option<Result<CodecContext, FfmpegError>> {
        self.input
            .stream(index)
            .map(|stream| CodecContext::from_parameters(stream.parameters()))
    }
}

impl PacketSource for MediaSource {
    fn next_packet(&mut self) -> Result<Option<Packet>, FrameDumpError> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => Ok(Some(packet)),
            Err(FfmpegError::Eof) => Ok(None),
            Err(error) => {
                // A demuxer read failure ends the input like end-of-file does.
                log::warn!(
                    "Stopped reading {} after demuxer error: {error}",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }
}

/// FFmpeg takes paths as raw bytes. Unix paths are passed through unchanged;
/// elsewhere only UTF-8 paths can be represented.
fn path_to_c_string(path: &Path) -> Result<CString, String> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let bytes = path
        .to_str()
        .ok_or_else(|| "Path is not valid UTF-8".to_string())?
        .as_bytes()
        .to_vec();

    CString::new(bytes).map_err(|error| format!("Path contains an interior NUL byte: {error}"))
}

fn container_duration(input: &Input) -> Duration {
    let microseconds = input.duration();
    if microseconds > 0 {
        Duration::from_micros(microseconds as u64)
    } else {
        Duration::ZERO
    }
}
