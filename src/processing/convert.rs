//! # Colour-Space Conversion
//!
//! Normalizes a captured [`Frame`] into the layout the display image uses:
//! RGB channel order, rows stored bottom-up.
//!
//! Row `i` of the output is row `height - 1 - i` of a top-down input, with
//! each pixel reordered to RGB (alpha, if any, is dropped). Inputs that are
//! already bottom-up keep their row order.
//!
//! ```rust
//! use capview::core::frame::{ChannelOrder, Frame, Size};
//! use capview::processing::convert;
//!
//! let frame = Frame::solid(Size::new(4, 4), ChannelOrder::Bgr, [255, 0, 0]).unwrap();
//! let normalized = convert::convert(&frame).unwrap();
//! assert_eq!(normalized.pixel(0, 0), [255, 0, 0]);
//! ```

use crate::core::frame::{ChannelOrder, Frame, NormalizedFrame, Orientation};
use crate::error::{CaptureError, CaptureResult};

const OUT_CHANNELS: usize = 3;

/// Converts into a freshly allocated buffer.
pub fn convert(frame: &Frame) -> CaptureResult<NormalizedFrame> {
    convert_into(frame, Vec::new())
}

/// Converts into `buffer`, reusing its allocation.
///
/// The previous contents of `buffer` are irrelevant; it is resized to the
/// output length and fully overwritten.
pub fn convert_into(frame: &Frame, mut buffer: Vec<u8>) -> CaptureResult<NormalizedFrame> {
    let size = frame.size();
    // Frame::new already refuses these; keep the converter total anyway.
    if size.is_empty() || frame.as_bytes().is_empty() {
        return Err(CaptureError::invalid_frame("cannot convert an empty frame"));
    }

    let height = size.height as usize;
    let out_row_len = size.width as usize * OUT_CHANNELS;
    buffer.resize(size.pixel_count() * OUT_CHANNELS, 0);

    for (out_index, out_row) in buffer.chunks_exact_mut(out_row_len).enumerate() {
        let src_index = match frame.orientation() {
            Orientation::TopDown => height - 1 - out_index,
            Orientation::BottomUp => out_index,
        };
        reorder_row(frame.order(), frame.row(src_index), out_row);
    }

    Ok(NormalizedFrame::from_display_bytes(size, buffer))
}

fn reorder_row(order: ChannelOrder, src: &[u8], dst: &mut [u8]) {
    match order {
        ChannelOrder::Rgb => dst.copy_from_slice(src),
        ChannelOrder::Bgr => {
            for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
                d[0] = s[2];
                d[1] = s[1];
                d[2] = s[0];
            }
        }
        ChannelOrder::Rgba => {
            for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(3)) {
                d.copy_from_slice(&s[..3]);
            }
        }
        ChannelOrder::Bgra => {
            for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(3)) {
                d[0] = s[2];
                d[1] = s[1];
                d[2] = s[0];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::Size;

    /// Every pixel encodes its own position: (x, y, x ^ y) as RGB.
    fn coordinate_frame(size: Size, order: ChannelOrder) -> Frame {
        let mut data = Vec::new();
        for y in 0..size.height as u8 {
            for x in 0..size.width as u8 {
                let (r, g, b) = (x, y, x ^ y);
                match order {
                    ChannelOrder::Rgb => data.extend_from_slice(&[r, g, b]),
                    ChannelOrder::Bgr => data.extend_from_slice(&[b, g, r]),
                    ChannelOrder::Rgba => data.extend_from_slice(&[r, g, b, 200]),
                    ChannelOrder::Bgra => data.extend_from_slice(&[b, g, r, 200]),
                }
            }
        }
        Frame::new(size, order, data).unwrap()
    }

    #[test]
    fn test_rows_are_reversed_and_reordered() {
        let size = Size::new(5, 3);
        for order in [
            ChannelOrder::Rgb,
            ChannelOrder::Bgr,
            ChannelOrder::Rgba,
            ChannelOrder::Bgra,
        ] {
            let out = convert(&coordinate_frame(size, order)).unwrap();
            assert_eq!(out.size(), size);
            assert_eq!(out.as_bytes().len(), 5 * 3 * 3);

            for i in 0..3u32 {
                let src_y = (3 - 1 - i) as u8;
                for x in 0..5u32 {
                    let x8 = x as u8;
                    assert_eq!(
                        out.pixel(x, i),
                        [x8, src_y, x8 ^ src_y],
                        "{:?} pixel ({}, {})",
                        order,
                        x,
                        i
                    );
                }
            }
        }
    }

    #[test]
    fn test_bottom_up_input_keeps_row_order() {
        let size = Size::new(2, 2);
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let frame =
            Frame::with_orientation(size, ChannelOrder::Rgb, Orientation::BottomUp, data.clone())
                .unwrap();
        assert_eq!(convert(&frame).unwrap().as_bytes(), &data[..]);
    }

    #[test]
    fn test_convert_into_reuses_buffer() {
        let frame = Frame::solid(Size::new(4, 4), ChannelOrder::Bgra, [1, 2, 3]).unwrap();
        let buffer = Vec::with_capacity(4096);
        let ptr = buffer.as_ptr();

        let out = convert_into(&frame, buffer).unwrap();
        assert!(out.as_bytes().chunks_exact(3).all(|p| p == [1, 2, 3]));
        assert_eq!(out.into_bytes().as_ptr(), ptr);
    }

    #[test]
    fn test_oversized_recycled_buffer_is_truncated() {
        let frame = Frame::solid(Size::new(1, 1), ChannelOrder::Bgr, [7, 8, 9]).unwrap();
        let out = convert_into(&frame, vec![0xAA; 64]).unwrap();
        assert_eq!(out.as_bytes(), &[7, 8, 9]);
    }
}
