//! Common test utilities and helpers for the capview tests
//!
//! Frame builders, scripted frame sources and assertions shared by the
//! integration tests.

#![allow(dead_code)]

/// Test frame utilities and constants
pub mod test_frames {
    use capview::{ChannelOrder, Frame, Size};

    pub const TINY_SIZE: Size = Size {
        width: 4,
        height: 4,
    };
    pub const VGA_SIZE: Size = Size {
        width: 640,
        height: 480,
    };

    /// A solid colour frame, BGR as a camera delivers it
    pub fn solid_frame(size: Size, rgb: [u8; 3]) -> Frame {
        Frame::solid(size, ChannelOrder::Bgr, rgb).expect("valid solid frame")
    }

    /// Grey frame whose every byte is `value`
    pub fn grey_frame(size: Size, value: u8) -> Frame {
        solid_frame(size, [value, value, value])
    }

    /// Top half red, bottom half blue, top-down BGR
    pub fn red_over_blue(size: Size) -> Frame {
        let mut data = Vec::with_capacity(size.pixel_count() * 3);
        for y in 0..size.height {
            let bgr = if y < size.height / 2 {
                [0, 0, 255]
            } else {
                [255, 0, 0]
            };
            for _ in 0..size.width {
                data.extend_from_slice(&bgr);
            }
        }
        Frame::new(size, ChannelOrder::Bgr, data).expect("valid frame")
    }
}

/// Frame sources with scripted behaviour
pub mod scripted {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

    use capview::capture::{FrameSource, SourceOpener};
    use capview::{CaptureError, CaptureResult, Frame};

    /// One scripted read
    pub enum Step {
        Frame(Frame),
        Fail(String),
        End,
    }

    /// Plays back a list of steps. Once the list is exhausted the stream
    /// ends. With a gate, every read first waits for a permit.
    pub struct ScriptedSource {
        steps: VecDeque<Step>,
        gate: Option<Receiver<()>>,
        reads: Arc<AtomicU64>,
    }

    impl ScriptedSource {
        pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                steps: steps.into_iter().collect(),
                gate: None,
                reads: Arc::new(AtomicU64::new(0)),
            }
        }

        pub fn frames(frames: impl IntoIterator<Item = Frame>) -> Self {
            Self::new(frames.into_iter().map(Step::Frame))
        }

        /// Each read blocks until a permit is sent. Dropping the sender
        /// ends the stream.
        pub fn gated(mut self) -> (Self, SyncSender<()>) {
            let (tx, rx) = sync_channel(16);
            self.gate = Some(rx);
            (self, tx)
        }

        /// Counter of completed reads, readable from the test thread
        pub fn read_counter(&self) -> Arc<AtomicU64> {
            self.reads.clone()
        }

        pub fn into_opener(self) -> SourceOpener {
            Box::new(move || Ok(Box::new(self) as Box<dyn FrameSource>))
        }
    }

    impl FrameSource for ScriptedSource {
        fn read_frame(&mut self) -> CaptureResult<Option<Frame>> {
            if let Some(gate) = &self.gate {
                if gate.recv().is_err() {
                    return Ok(None);
                }
            }
            self.reads.fetch_add(1, Ordering::SeqCst);
            match self.steps.pop_front() {
                Some(Step::Frame(frame)) => Ok(Some(frame)),
                Some(Step::Fail(reason)) => Err(CaptureError::frame_capture(reason)),
                Some(Step::End) | None => Ok(None),
            }
        }

        fn describe(&self) -> String {
            format!("scripted ({} steps left)", self.steps.len())
        }
    }

    /// Wraps an already built source in an opener
    pub fn opener_from<S: FrameSource + Send + 'static>(source: S) -> SourceOpener {
        Box::new(move || Ok(Box::new(source) as Box<dyn FrameSource>))
    }

    /// An opener that fails the way a missing device does
    pub fn unavailable_opener(device: &str) -> SourceOpener {
        let device = device.to_string();
        Box::new(move || Err(CaptureError::device_unavailable(device, "no such device")))
    }
}

/// Fatal handlers that record instead of exiting
pub mod handlers {
    use std::sync::{Arc, Mutex};

    use capview::CaptureError;
    use capview::acquisition::FatalHandler;
    use capview::render::SurfaceCloser;

    /// Records exit codes of fatal errors
    pub fn recording() -> (FatalHandler, Arc<Mutex<Vec<i32>>>) {
        let codes = Arc::new(Mutex::new(Vec::new()));
        let sink = codes.clone();
        let handler: FatalHandler = Arc::new(move |error: &CaptureError| {
            sink.lock().unwrap().push(error.exit_code());
        });
        (handler, codes)
    }

    /// Records exit codes and closes a headless surface, standing in for the
    /// process exit
    pub fn recording_and_closing(
        closer: SurfaceCloser,
    ) -> (FatalHandler, Arc<Mutex<Vec<i32>>>) {
        let (record, codes) = recording();
        let handler: FatalHandler = Arc::new(move |error: &CaptureError| {
            record(error);
            closer.close();
        });
        (handler, codes)
    }
}

/// Custom assertions for testing
pub mod assertions {
    use std::time::{Duration, Instant};

    use capview::render::DisplayImage;

    /// Assert that every pixel of the display image is `rgb`
    pub fn assert_display_solid(display: &DisplayImage, rgb: [u8; 3]) {
        for (i, pixel) in display.as_bytes().chunks_exact(3).enumerate() {
            assert_eq!(pixel, rgb, "pixel {} differs", i);
        }
    }

    /// Polls `condition` until it holds or `timeout` passes
    pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        condition()
    }
}
