//! # Camera Source
//!
//! Webcam capture through `nokhwa`. Device `n` is the `n`th camera the
//! platform backend enumerates. Frames are decoded to RGB, top-down.

use log::{debug, warn};
use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};

use crate::capture::FrameSource;
use crate::core::frame::{ChannelOrder, Frame, Size};
use crate::error::{CaptureError, CaptureResult};

/// Frame rate asked for alongside the requested size.
const REQUESTED_FPS: u32 = 30;

/// A camera opened through `nokhwa`.
pub struct CameraSource {
    camera: Camera,
    index: u32,
    size: Size,
}

impl CameraSource {
    /// Opens camera `index` and starts its stream.
    ///
    /// `requested` is advisory: the closest format the camera supports is
    /// used and a difference is only logged.
    pub fn open(index: usize, requested: Size) -> CaptureResult<Self> {
        let device = format!("camera:{}", index);
        let index = u32::try_from(index)
            .map_err(|_| CaptureError::device_unavailable(&device, "index out of range"))?;

        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(requested.width, requested.height),
                FrameFormat::MJPEG,
                REQUESTED_FPS,
            ),
        ));
        let mut camera = Camera::new(CameraIndex::Index(index), format)
            .map_err(|e| CaptureError::device_unavailable(&device, e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CaptureError::device_unavailable(&device, e.to_string()))?;

        let resolution = camera.resolution();
        let size = Size::new(resolution.width(), resolution.height());
        if size != requested {
            warn!(
                "{}: requested {} but the camera streams at {}",
                device, requested, size
            );
        }
        debug!("{} ({}) opened at {}", device, camera.info().human_name(), size);

        Ok(Self {
            camera,
            index,
            size,
        })
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> CaptureResult<Option<Frame>> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::frame_capture(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::frame_capture(e.to_string()))?;
        let size = Size::new(image.width(), image.height());
        Frame::new(size, ChannelOrder::Rgb, image.into_raw()).map(Some)
    }

    fn describe(&self) -> String {
        format!("camera:{} {}", self.index, self.size)
    }
}
