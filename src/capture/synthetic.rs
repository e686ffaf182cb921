//! # Synthetic Capture Source
//!
//! Generates frames the way a camera driver hands them over: BGR channel
//! order, top-down rows. Used for demos, headless runs and tests.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crate::capture::FrameSource;
use crate::core::frame::{ChannelOrder, Frame, Size};
use crate::error::{CaptureError, CaptureResult};

/// Colours cycled through by [`Pattern::SolidCycle`], as RGB.
pub const SOLID_CYCLE: [[u8; 3]; 6] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 255, 0],
    [0, 255, 255],
    [255, 0, 255],
];

/// What a generated frame shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Each frame one solid colour from [`SOLID_CYCLE`]
    SolidCycle,
    /// A vertical white bar sweeping across a gradient; red at the top so
    /// a wrong row order is obvious on screen
    MovingBar,
}

enum Feed {
    Generated { size: Size, pattern: Pattern },
    Scripted(VecDeque<Frame>),
}

/// A frame source with no device behind it.
pub struct SyntheticSource {
    feed: Feed,
    frame_limit: Option<u64>,
    frame_interval: Option<Duration>,
    frames_read: u64,
}

impl SyntheticSource {
    /// Generates `pattern` frames of `size`, forever unless limited.
    pub fn pattern(size: Size, pattern: Pattern) -> CaptureResult<Self> {
        if size.is_empty() {
            return Err(CaptureError::device_unavailable(
                "synthetic:0",
                format!("cannot generate {} frames", size),
            ));
        }
        Ok(Self {
            feed: Feed::Generated { size, pattern },
            frame_limit: None,
            frame_interval: None,
            frames_read: 0,
        })
    }

    /// Replays `frames` in order, then ends the stream.
    pub fn from_frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            feed: Feed::Scripted(frames.into_iter().collect()),
            frame_limit: None,
            frame_interval: None,
            frames_read: 0,
        }
    }

    /// Ends the stream after `limit` frames.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Makes every read block for `interval`, like a camera's exposure.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn generate(&self, size: Size, pattern: Pattern) -> CaptureResult<Frame> {
        let index = self.frames_read;
        match pattern {
            Pattern::SolidCycle => {
                let rgb = SOLID_CYCLE[(index % SOLID_CYCLE.len() as u64) as usize];
                Frame::solid(size, ChannelOrder::Bgr, rgb)
            }
            Pattern::MovingBar => Frame::new(size, ChannelOrder::Bgr, moving_bar(size, index)),
        }
    }
}

fn moving_bar(size: Size, index: u64) -> Vec<u8> {
    let (width, height) = (size.width as usize, size.height as usize);
    let bar_width = (width / 16).max(1);
    let bar_x = (index as usize * bar_width / 2) % width;
    let marker_rows = (height / 10).max(1);

    let mut data = Vec::with_capacity(size.pixel_count() * 3);
    for y in 0..height {
        for x in 0..width {
            let bgr = if y < marker_rows {
                [0, 0, 255]
            } else if (bar_x..bar_x + bar_width).contains(&x) {
                [255, 255, 255]
            } else {
                let r = (x * 255 / width.max(1)) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                [128, g, r]
            };
            data.extend_from_slice(&bgr);
        }
    }
    data
}

impl FrameSource for SyntheticSource {
    fn read_frame(&mut self) -> CaptureResult<Option<Frame>> {
        if self.frame_limit.is_some_and(|limit| self.frames_read >= limit) {
            return Ok(None);
        }
        if let Some(interval) = self.frame_interval {
            thread::sleep(interval);
        }

        let frame = match &mut self.feed {
            Feed::Scripted(frames) => frames.pop_front(),
            Feed::Generated { size, pattern } => {
                let (size, pattern) = (*size, *pattern);
                Some(self.generate(size, pattern)?)
            }
        };
        if frame.is_some() {
            self.frames_read += 1;
        }
        Ok(frame)
    }

    fn describe(&self) -> String {
        match &self.feed {
            Feed::Generated { size, pattern } => format!("synthetic {:?} {}", pattern, size),
            Feed::Scripted(frames) => format!("scripted ({} frames left)", frames.len()),
        }
    }
}
