//! # Latest Frame Slot
//!
//! The single hand-off point between the acquisition thread (writer) and
//! the rendering thread (reader).
//!
//! - One slot, one lock. Latest write wins: there is no queue and no
//!   backpressure, and a frame the reader never saw is simply replaced.
//! - The lock is held only while a frame is swapped in or copied out,
//!   never while capturing or rendering.
//! - Frames are swapped in whole, so the reader sees either the previous
//!   frame or the new one, never a mix.
//!
//! ```rust
//! use capview::core::frame::{ChannelOrder, Frame, Size};
//! use capview::core::latest_frame::{Consumed, LatestFrame};
//! use capview::processing::convert;
//! use capview::render::DisplayImage;
//!
//! let latest = LatestFrame::new();
//! let mut display = DisplayImage::new(Size::new(2, 2)).unwrap();
//! assert_eq!(latest.consume_into(&mut display).unwrap(), Consumed::Empty);
//!
//! let frame = Frame::solid(Size::new(2, 2), ChannelOrder::Bgr, [0, 255, 0]).unwrap();
//! latest.publish(convert::convert(&frame).unwrap());
//! assert_eq!(latest.consume_into(&mut display).unwrap(), Consumed::Fresh(1));
//! assert_eq!(latest.consume_into(&mut display).unwrap(), Consumed::Repeat(1));
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::frame::NormalizedFrame;
use crate::error::CaptureResult;
use crate::render::DisplayImage;

/// What happened to a frame handed to [`LatestFrame::publish`].
#[derive(Debug)]
pub enum PublishOutcome {
    /// The frame is now the latest one. `displaced` is the frame it
    /// replaced, returned so its buffer can be recycled.
    Stored {
        sequence: u64,
        displaced: Option<NormalizedFrame>,
    },
    /// The slot is closed for shutdown; the frame is handed back.
    Rejected(NormalizedFrame),
}

/// Result of [`LatestFrame::consume_into`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed {
    /// Nothing has been published yet; the display was not touched.
    Empty,
    /// A frame the display did not hold yet was copied in.
    Fresh(u64),
    /// The display already holds the latest frame; nothing to copy.
    Repeat(u64),
}

#[derive(Debug, Default)]
struct Slot {
    frame: Option<NormalizedFrame>,
    sequence: u64,
    closed: bool,
}

/// Single-slot, lock-protected holder of the most recent normalized frame.
#[derive(Debug, Default)]
pub struct LatestFrame {
    slot: Mutex<Slot>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    // Writers replace the whole frame, so a panic while holding the lock
    // cannot leave a half-written frame behind.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the stored frame.
    pub fn publish(&self, frame: NormalizedFrame) -> PublishOutcome {
        let mut slot = self.lock();
        if slot.closed {
            return PublishOutcome::Rejected(frame);
        }
        slot.sequence += 1;
        let displaced = slot.frame.replace(frame);
        PublishOutcome::Stored {
            sequence: slot.sequence,
            displaced,
        }
    }

    /// Copies the stored frame into `display`.
    ///
    /// Returns [`crate::error::CaptureError::DimensionMismatch`] without
    /// touching `display` if the stored frame has a different size.
    pub fn consume_into(&self, display: &mut DisplayImage) -> CaptureResult<Consumed> {
        let slot = self.lock();
        let Some(frame) = slot.frame.as_ref() else {
            return Ok(Consumed::Empty);
        };
        if display.sequence() == Some(slot.sequence) {
            return Ok(Consumed::Repeat(slot.sequence));
        }
        display.copy_from(frame, slot.sequence)?;
        Ok(Consumed::Fresh(slot.sequence))
    }

    /// Refuses every later publish.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Sequence number of the most recent publish; 0 before the first.
    pub fn latest_sequence(&self) -> u64 {
        self.lock().sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::{ChannelOrder, Frame, Size};
    use crate::processing::convert;

    fn solid(size: Size, rgb: [u8; 3]) -> NormalizedFrame {
        convert::convert(&Frame::solid(size, ChannelOrder::Bgr, rgb).unwrap()).unwrap()
    }

    #[test]
    fn test_consume_before_publish_is_noop() {
        let latest = LatestFrame::new();
        let mut display = DisplayImage::new(Size::new(2, 2)).unwrap();
        let before = display.clone();

        assert_eq!(latest.consume_into(&mut display).unwrap(), Consumed::Empty);
        assert_eq!(display, before);
    }

    #[test]
    fn test_latest_write_wins() {
        let size = Size::new(2, 2);
        let latest = LatestFrame::new();
        let mut display = DisplayImage::new(size).unwrap();

        latest.publish(solid(size, [1, 1, 1]));
        let outcome = latest.publish(solid(size, [2, 2, 2]));
        match outcome {
            PublishOutcome::Stored {
                sequence,
                displaced,
            } => {
                assert_eq!(sequence, 2);
                assert_eq!(displaced.unwrap().pixel(0, 0), [1, 1, 1]);
            }
            PublishOutcome::Rejected(_) => panic!("slot should be open"),
        }

        assert_eq!(latest.consume_into(&mut display).unwrap(), Consumed::Fresh(2));
        assert!(display.as_bytes().iter().all(|&b| b == 2));
    }

    #[test]
    fn test_repeated_consume_is_idempotent() {
        let size = Size::new(3, 2);
        let latest = LatestFrame::new();
        let mut display = DisplayImage::new(size).unwrap();
        latest.publish(solid(size, [5, 6, 7]));

        latest.consume_into(&mut display).unwrap();
        let first = display.clone();
        assert_eq!(latest.consume_into(&mut display).unwrap(), Consumed::Repeat(1));
        assert_eq!(display, first);
    }

    #[test]
    fn test_mismatched_frame_leaves_display_untouched() {
        let latest = LatestFrame::new();
        let mut display = DisplayImage::new(Size::new(4, 4)).unwrap();
        latest.publish(solid(Size::new(4, 4), [9, 9, 9]));
        latest.consume_into(&mut display).unwrap();
        let shown = display.clone();

        latest.publish(solid(Size::new(8, 8), [1, 2, 3]));
        let err = latest.consume_into(&mut display).unwrap_err();
        assert_eq!(err.category(), "dimension_mismatch");
        assert_eq!(display, shown);
    }

    #[test]
    fn test_closed_slot_rejects_publish() {
        let size = Size::new(1, 1);
        let latest = LatestFrame::new();
        latest.publish(solid(size, [1, 1, 1]));
        latest.close();

        assert!(latest.is_closed());
        assert!(matches!(
            latest.publish(solid(size, [2, 2, 2])),
            PublishOutcome::Rejected(_)
        ));
        assert_eq!(latest.latest_sequence(), 1);
    }
}
