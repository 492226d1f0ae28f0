//! Binary pixel-map (`P6`) output.
//!
//! Each frame is written as a plain-text header `P6\n<width> <height>\n255\n`
//! followed by `height` rows of `width * 3` RGB bytes. The pixels go through
//! [`RgbFrame::to_image`], so row padding in the source buffer never reaches
//! the file.

use std::{
    fs::File,
    io::{BufWriter, Result as IoResult, Write},
    path::{Path, PathBuf},
};

use crate::{error::FrameDumpError, frame::RgbFrame};

/// File extension of written frames.
pub const FRAME_EXTENSION: &str = "ppm";

/// Destination for converted frames.
pub trait FrameSink {
    /// Persist `frame` as frame number `sequence`, returning where it went.
    fn write_frame(&mut self, frame: &RgbFrame, sequence: u64) -> Result<PathBuf, FrameDumpError>;
}

/// Serialize `frame` as `P6` into any writer.
pub fn encode_ppm<W: Write>(frame: &RgbFrame, writer: &mut W) -> IoResult<()> {
    let image = frame.to_image();
    write!(writer, "P6\n{} {}\n255\n", image.width(), image.height())?;
    writer.write_all(image.as_raw())
}

/// Write `frame` to `path` as a `P6` file.
///
/// # Errors
///
/// Returns [`FrameDumpError::FileWrite`] if the file cannot be created
/// (missing directory, permissions) or a write fails part way.
pub fn write_ppm<P: AsRef<Path>>(frame: &RgbFrame, path: P) -> Result<(), FrameDumpError> {
    let path = path.as_ref();
    let failed = |source| FrameDumpError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(failed)?;
    let mut writer = BufWriter::new(file);
    encode_ppm(frame, &mut writer).map_err(failed)?;
    writer.flush().map_err(failed)?;
    Ok(())
}

/// File name for frame number `sequence`, e.g. `frame-12.ppm`.
pub fn frame_file_name(prefix: &str, sequence: u64) -> String {
    format!("{prefix}-{sequence}.{FRAME_EXTENSION}")
}

/// Writes numbered `P6` files into one directory.
#[derive(Debug, Clone)]
pub struct PpmWriter {
    directory: PathBuf,
    prefix: String,
}

impl PpmWriter {
    /// Write into `directory` using `prefix` for file names. The directory is
    /// not created.
    pub fn new<P: Into<PathBuf>, S: Into<String>>(directory: P, prefix: S) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    /// Path frame number `sequence` is written to.
    pub fn path_for(&self, sequence: u64) -> PathBuf {
        self.directory.join(frame_file_name(&self.prefix, sequence))
    }
}

impl FrameSink for PpmWriter {
    fn write_frame(&mut self, frame: &RgbFrame, sequence: u64) -> Result<PathBuf, FrameDumpError> {
        let path = self.path_for(sequence);
        write_ppm(frame, &path)?;
        log::trace!("Wrote {}", path.display());
        Ok(path)
    }
}
