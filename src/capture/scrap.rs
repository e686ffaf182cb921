//! # Scrap Screen Source
//!
//! Live desktop capture through the `scrap` library. Each display is a
//! device; index 0 is the first display `scrap` reports.
//!
//! `scrap` hands out BGRA rows that may be padded past `width * 4`; rows are
//! repacked into a tight [`Frame`] before they leave this module.
//!
//! An unchanged desktop can leave `scrap` reporting `WouldBlock` for as long
//! as nothing moves, so a read keeps polling until a frame arrives or the
//! run flag is cleared.

use std::io::ErrorKind;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use scrap::{Capturer, Display};

use crate::capture::FrameSource;
use crate::core::frame::{ChannelOrder, Frame, Size};
use crate::core::run_flag::RunFlag;
use crate::error::{CaptureError, CaptureResult};

/// Poll interval while the compositor has no new frame ready.
const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(2);

/// A display captured through `scrap`.
pub struct ScreenSource {
    capturer: Capturer,
    index: usize,
    size: Size,
    run_flag: Option<RunFlag>,
}

impl ScreenSource {
    /// Opens display `index`.
    ///
    /// `requested` is advisory: the display's own resolution wins and a
    /// difference is only logged.
    pub fn open(index: usize, requested: Size) -> CaptureResult<Self> {
        let device = format!("screen:{}", index);
        let displays = Display::all()
            .map_err(|e| CaptureError::device_unavailable(&device, e.to_string()))?;
        let count = displays.len();
        let display = displays.into_iter().nth(index).ok_or_else(|| {
            CaptureError::device_unavailable(&device, format!("{} display(s) found", count))
        })?;

        let capturer = Capturer::new(display)
            .map_err(|e| CaptureError::device_unavailable(&device, e.to_string()))?;
        let size = Size::new(capturer.width() as u32, capturer.height() as u32);
        if size != requested {
            warn!(
                "{}: requested {} but the display captures at {}",
                device, requested, size
            );
        }
        debug!("{} opened at {}", device, size);

        Ok(Self {
            capturer,
            index,
            size,
            run_flag: None,
        })
    }
}

impl FrameSource for ScreenSource {
    fn read_frame(&mut self) -> CaptureResult<Option<Frame>> {
        let height = self.size.height as usize;
        let row_len = self.size.width as usize * 4;

        loop {
            match self.capturer.frame() {
                Ok(raw) => {
                    let stride = raw.len() / height.max(1);
                    if stride < row_len {
                        return Err(CaptureError::frame_capture(format!(
                            "display returned {} bytes for a {} frame",
                            raw.len(),
                            self.size
                        )));
                    }
                    let mut data = Vec::with_capacity(row_len * height);
                    for row in raw.chunks(stride).take(height) {
                        data.extend_from_slice(&row[..row_len]);
                    }
                    return Frame::new(self.size, ChannelOrder::Bgra, data).map(Some);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if self.run_flag.as_ref().is_some_and(|flag| !flag.is_running()) {
                        debug!("screen:{} read abandoned on stop", self.index);
                        return Ok(None);
                    }
                    thread::sleep(WOULD_BLOCK_BACKOFF);
                }
                Err(e) => return Err(CaptureError::frame_capture(e.to_string())),
            }
        }
    }

    fn describe(&self) -> String {
        format!("screen:{} {}", self.index, self.size)
    }

    fn watch_run_flag(&mut self, run_flag: &RunFlag) {
        self.run_flag = Some(run_flag.clone());
    }
}
