//! The preallocated RGB24 destination frame.
//!
//! One [`RgbFrame`] is allocated per capture at the decoder's resolved
//! geometry and overwritten for every decoded frame. Rows are padded so that
//! each starts on a [`ROW_ALIGNMENT`]-byte boundary; only the first
//! `width * 3` bytes of a row carry pixels.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use image::RgbImage;

use crate::error::FrameDumpError;

/// Bytes per RGB24 pixel.
pub const BYTES_PER_PIXEL: usize = 3;

/// Row alignment of the frame buffer, in bytes.
pub const ROW_ALIGNMENT: usize = 16;

/// Compute `(stride, total_size)` for an RGB24 buffer, or `None` on
/// arithmetic overflow.
pub fn buffer_layout(width: u32, height: u32) -> Option<(usize, usize)> {
    let row_bytes = (width as usize).checked_mul(BYTES_PER_PIXEL)?;
    let stride = row_bytes.checked_next_multiple_of(ROW_ALIGNMENT)?;
    let size = stride.checked_mul(height as usize)?;
    Some((stride, size))
}

/// An interleaved RGB24 image backed by a single row-padded buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct RgbFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

impl Debug for RgbFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RgbFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("buffer_len", &self.data.len())
            .finish()
    }
}

impl RgbFrame {
    /// Allocate a zeroed frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameDumpError::Allocation`] if either dimension is zero,
    /// if the buffer size overflows, or if the memory cannot be reserved.
    pub fn allocate(width: u32, height: u32) -> Result<Self, FrameDumpError> {
        let refuse = |reason: &str| FrameDumpError::Allocation {
            width,
            height,
            reason: reason.to_string(),
        };

        if width == 0 || height == 0 {
            return Err(refuse("width and height must both be positive"));
        }

        let (stride, size) =
            buffer_layout(width, height).ok_or_else(|| refuse("buffer size overflows usize"))?;

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|error| refuse(&error.to_string()))?;
        data.resize(size, 0);

        log::debug!("Allocated {width}x{height} RGB24 frame ({size} bytes, stride {stride})");

        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance in bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of pixel bytes in one row, excluding padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// The pixel bytes of row `y`, without trailing padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Mutable pixel bytes of row `y`, without trailing padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let end = start + self.row_bytes();
        &mut self.data[start..end]
    }

    /// Iterate over the rows, top to bottom, without padding.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    /// The whole buffer, padding included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The whole buffer, padding included, for in-place conversion.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copy the pixels into a contiguous [`RgbImage`], dropping row padding.
    pub fn to_image(&self) -> RgbImage {
        let mut image = RgbImage::new(self.width, self.height);
        for (target, source) in image.chunks_exact_mut(self.row_bytes()).zip(self.rows()) {
            target.copy_from_slice(source);
        }
        image
    }

    /// Set every pixel to one colour. Padding is left untouched.
    pub fn fill(&mut self, red: u8, green: u8, blue: u8) {
        for y in 0..self.height {
            for pixel in self.row_mut(y).chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&[red, green, blue]);
            }
        }
    }
}
