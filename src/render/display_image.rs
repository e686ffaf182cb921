//! The image object a rendering surface draws from.

use crate::core::frame::{NormalizedFrame, Size};
use crate::error::{CaptureError, CaptureResult};

/// A pre-allocated RGB, bottom-up image with fixed dimensions.
///
/// Blank (all zero) until the first frame is copied in. The size never
/// changes after construction; frames of any other size are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    size: Size,
    data: Vec<u8>,
    sequence: Option<u64>,
}

impl DisplayImage {
    pub const CHANNELS: usize = 3;

    pub fn new(size: Size) -> CaptureResult<Self> {
        if size.is_empty() {
            return Err(CaptureError::invalid_frame(format!(
                "display image cannot be {}",
                size
            )));
        }
        Ok(Self {
            size,
            data: vec![0u8; size.pixel_count() * Self::CHANNELS],
            sequence: None,
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Sequence number of the published frame currently shown, if any.
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Row `index` counted from the bottom of the picture.
    pub fn row(&self, index: usize) -> &[u8] {
        let len = self.size.width as usize * Self::CHANNELS;
        &self.data[index * len..(index + 1) * len]
    }

    /// Copies `frame` in and tags the image with `sequence`.
    ///
    /// A frame of another size leaves the image untouched and returns
    /// [`CaptureError::DimensionMismatch`].
    pub fn copy_from(&mut self, frame: &NormalizedFrame, sequence: u64) -> CaptureResult<()> {
        if frame.size() != self.size {
            return Err(CaptureError::dimension_mismatch(self.size, frame.size()));
        }
        self.data.copy_from_slice(frame.as_bytes());
        self.sequence = Some(sequence);
        Ok(())
    }

    /// A top-down copy suitable for writing to an image file.
    pub fn to_rgb_image(&self) -> CaptureResult<image::RgbImage> {
        let row_len = self.size.width as usize * Self::CHANNELS;
        let mut top_down = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_len).rev() {
            top_down.extend_from_slice(row);
        }
        image::RgbImage::from_raw(self.size.width, self.size.height, top_down).ok_or_else(|| {
            CaptureError::invalid_frame(format!("cannot export {} display image", self.size))
        })
    }

    /// Writes the current contents to `path`; the format follows the
    /// extension.
    pub fn save(&self, path: &std::path::Path) -> CaptureResult<()> {
        self.to_rgb_image()?.save(path).map_err(|e| match e {
            image::ImageError::IoError(io) => {
                CaptureError::io("write snapshot", io).with_path(path.display().to_string())
            }
            other => CaptureError::from(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::{ChannelOrder, Frame};
    use crate::processing::convert;

    #[test]
    fn test_new_display_is_blank() {
        let display = DisplayImage::new(Size::new(3, 2)).unwrap();
        assert_eq!(display.as_bytes().len(), 18);
        assert!(display.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(display.sequence(), None);
    }

    #[test]
    fn test_zero_sized_display_rejected() {
        assert!(DisplayImage::new(Size::new(0, 0)).is_err());
    }

    #[test]
    fn test_copy_rejects_other_size() {
        let mut display = DisplayImage::new(Size::new(4, 4)).unwrap();
        let frame = Frame::solid(Size::new(2, 2), ChannelOrder::Bgr, [9, 9, 9]).unwrap();
        let normalized = convert::convert(&frame).unwrap();

        let err = display.copy_from(&normalized, 1).unwrap_err();
        assert_eq!(err.category(), "dimension_mismatch");
        assert!(display.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(display.sequence(), None);
    }

    #[test]
    fn test_rgb_image_export_is_top_down() {
        // Top row red, bottom row blue, as a camera would deliver it.
        let mut data = vec![0u8, 0, 255];
        data.extend_from_slice(&[255, 0, 0]);
        let frame = Frame::new(Size::new(1, 2), ChannelOrder::Bgr, data).unwrap();
        let mut display = DisplayImage::new(Size::new(1, 2)).unwrap();
        display.copy_from(&convert::convert(&frame).unwrap(), 1).unwrap();

        // Bottom-up in memory...
        assert_eq!(display.row(0), &[0, 0, 255]);
        // ...top-down once exported.
        let exported = display.to_rgb_image().unwrap();
        assert_eq!(exported.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(exported.get_pixel(0, 1).0, [0, 0, 255]);
    }
}
