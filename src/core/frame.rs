//! # Frame Model
//!
//! Pixel containers shared by the capture, conversion and presentation
//! stages.
//!
//! - [`Frame`]: what a frame source produces. Any supported channel order,
//!   normally top-down.
//! - [`NormalizedFrame`]: RGB, bottom-up. Only the converter builds these,
//!   and only these can be published to the latest-frame slot.
//!
//! All buffers are tightly packed (`stride == width * channels`).

use std::fmt;

use crate::error::{CaptureError, CaptureResult};

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Byte order of the channels within one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl ChannelOrder {
    /// The order every display image uses.
    pub const DISPLAY: ChannelOrder = ChannelOrder::Rgb;

    pub fn channels(&self) -> usize {
        match self {
            ChannelOrder::Rgb | ChannelOrder::Bgr => 3,
            ChannelOrder::Rgba | ChannelOrder::Bgra => 4,
        }
    }
}

/// Row order of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// First row in memory is the top of the picture (capture devices).
    TopDown,
    /// First row in memory is the bottom of the picture (display image).
    BottomUp,
}

/// A captured frame in its source's native layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    size: Size,
    order: ChannelOrder,
    orientation: Orientation,
    data: Vec<u8>,
}

impl Frame {
    /// Wraps a top-down pixel buffer.
    ///
    /// Fails with [`CaptureError::InvalidFrame`] for a zero-sized frame or a
    /// buffer whose length is not `width * height * channels`.
    pub fn new(size: Size, order: ChannelOrder, data: Vec<u8>) -> CaptureResult<Self> {
        Self::with_orientation(size, order, Orientation::TopDown, data)
    }

    pub fn with_orientation(
        size: Size,
        order: ChannelOrder,
        orientation: Orientation,
        data: Vec<u8>,
    ) -> CaptureResult<Self> {
        if size.is_empty() {
            return Err(CaptureError::invalid_frame(format!(
                "zero-sized frame ({})",
                size
            )));
        }
        let expected = size.pixel_count() * order.channels();
        if data.len() != expected {
            return Err(CaptureError::invalid_frame(format!(
                "{} {:?} frame needs {} bytes, got {}",
                size,
                order,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            size,
            order,
            orientation,
            data,
        })
    }

    /// A frame filled with one colour, given as `[r, g, b]` and stored in
    /// `order`.
    pub fn solid(size: Size, order: ChannelOrder, rgb: [u8; 3]) -> CaptureResult<Self> {
        let pixel = encode_pixel(order, rgb);
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(size.pixel_count() * order.channels())
            .collect();
        Self::new(size, order, data)
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn channels(&self) -> usize {
        self.order.channels()
    }

    pub fn row_len(&self) -> usize {
        self.size.width as usize * self.channels()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Row `index` in memory order.
    pub fn row(&self, index: usize) -> &[u8] {
        let len = self.row_len();
        &self.data[index * len..(index + 1) * len]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// An RGB, bottom-up frame ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFrame {
    size: Size,
    data: Vec<u8>,
}

impl NormalizedFrame {
    /// Only the converter knows the buffer already has display layout.
    pub(crate) fn from_display_bytes(size: Size, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), size.pixel_count() * 3);
        Self { size, data }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Row `index` counted from the bottom of the picture.
    pub fn row(&self, index: usize) -> &[u8] {
        let len = self.size.width as usize * 3;
        &self.data[index * len..(index + 1) * len]
    }

    /// Colour of the pixel at (`x`, `y`) with `y` counted from the bottom.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let at = (y as usize * self.size.width as usize + x as usize) * 3;
        [self.data[at], self.data[at + 1], self.data[at + 2]]
    }

    /// Hands the buffer back, typically to the buffer pool.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn encode_pixel(order: ChannelOrder, [r, g, b]: [u8; 3]) -> Vec<u8> {
    match order {
        ChannelOrder::Rgb => vec![r, g, b],
        ChannelOrder::Bgr => vec![b, g, r],
        ChannelOrder::Rgba => vec![r, g, b, 255],
        ChannelOrder::Bgra => vec![b, g, r, 255],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_zero_size() {
        let err = Frame::new(Size::new(0, 4), ChannelOrder::Bgr, Vec::new()).unwrap_err();
        assert_eq!(err.category(), "invalid_frame");
    }

    #[test]
    fn test_frame_rejects_short_buffer() {
        let err = Frame::new(Size::new(2, 2), ChannelOrder::Bgra, vec![0; 12]).unwrap_err();
        assert!(err.to_string().contains("needs 16 bytes, got 12"));
    }

    #[test]
    fn test_solid_frame_channel_layout() {
        let frame = Frame::solid(Size::new(2, 1), ChannelOrder::Bgr, [10, 20, 30]).unwrap();
        assert_eq!(frame.as_bytes(), &[30, 20, 10, 30, 20, 10]);
        assert_eq!(frame.orientation(), Orientation::TopDown);

        let frame = Frame::solid(Size::new(1, 1), ChannelOrder::Bgra, [1, 2, 3]).unwrap();
        assert_eq!(frame.as_bytes(), &[3, 2, 1, 255]);
    }

    #[test]
    fn test_size_display() {
        assert_eq!(Size::new(640, 480).to_string(), "640x480");
        assert_eq!(Size::new(640, 480).pixel_count(), 307_200);
    }
}
