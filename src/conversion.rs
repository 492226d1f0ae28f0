//! Native pixel format → RGB24 conversion.
//!
//! [`RgbConverter`] drives libswscale directly into the caller's
//! preallocated [`RgbFrame`], so no intermediate FFmpeg frame is allocated
//! per decoded picture. Conversion never resizes: a decoded frame whose
//! geometry differs from the destination is rejected.

use std::{os::raw::c_int, ptr};

use ffmpeg_next::{
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use ffmpeg_sys_next::sws_scale;

use crate::{error::FrameDumpError, frame::RgbFrame};

/// Converts a decoded frame into the RGB24 destination buffer.
pub trait FrameConverter {
    /// Overwrite `target` with the pixels of `frame`.
    fn convert(&mut self, frame: &VideoFrame, target: &mut RgbFrame) -> Result<(), FrameDumpError>;
}

struct Scaler {
    context: ScalingContext,
    format: Pixel,
    width: u32,
    height: u32,
}

/// libswscale-backed converter.
///
/// The scaling context is built from the first frame's native format and
/// rebuilt if a later frame arrives in a different format.
#[derive(Default)]
pub struct RgbConverter {
    scaler: Option<Scaler>,
}

impl RgbConverter {
    /// Create a converter with no scaling context yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn scaler_for(
        &mut self,
        format: Pixel,
        width: u32,
        height: u32,
    ) -> Result<&mut ScalingContext, FrameDumpError> {
        let reusable = self.scaler.as_ref().is_some_and(|scaler| {
            scaler.format == format && scaler.width == width && scaler.height == height
        });

        if !reusable {
            log::debug!("Creating {format:?} -> RGB24 scaler for {width}x{height}");
            let context = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )
            .map_err(|error| {
                FrameDumpError::Conversion(format!(
                    "no conversion from {format:?} to RGB24: {error}"
                ))
            })?;
            self.scaler = Some(Scaler {
                context,
                format,
                width,
                height,
            });
        }

        match self.scaler.as_mut() {
            Some(scaler) => Ok(&mut scaler.context),
            None => Err(FrameDumpError::Conversion(
                "scaler unavailable".to_string(),
            )),
        }
    }
}

impl FrameConverter for RgbConverter {
    fn convert(&mut self, frame: &VideoFrame, target: &mut RgbFrame) -> Result<(), FrameDumpError> {
        let (width, height) = (frame.width(), frame.height());
        if width != target.width() || height != target.height() {
            return Err(FrameDumpError::Conversion(format!(
                "decoded frame is {width}x{height} but the output buffer is {}x{}",
                target.width(),
                target.height(),
            )));
        }

        let format = frame.format();
        if format == Pixel::None {
            return Err(FrameDumpError::Conversion(
                "decoded frame has no pixel format".to_string(),
            ));
        }

        let stride = target.stride() as c_int;
        let destination = [
            target.as_bytes_mut().as_mut_ptr(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
        ];
        let destination_strides: [c_int; 4] = [stride, 0, 0, 0];

        let scaler = self.scaler_for(format, width, height)?;

        // SAFETY: the scaler was built for exactly this source format and
        // geometry, and the destination holds `stride * height` bytes with
        // `stride >= width * 3`, which is what libswscale writes for one
        // RGB24 plane.
        let rows = unsafe {
            let source = frame.as_ptr();
            sws_scale(
                scaler.as_mut_ptr(),
                (*source).data.as_ptr() as *const *const u8,
                (*source).linesize.as_ptr(),
                0,
                height as c_int,
                destination.as_ptr(),
                destination_strides.as_ptr(),
            )
        };

        if rows < 0 {
            return Err(FrameDumpError::Conversion(format!(
                "sws_scale failed with status {rows}"
            )));
        }
        Ok(())
    }
}
