//! # Capture Module
//!
//! Frame sources: anything that can be asked, blocking, for the next frame.
//!
//! A source is opened on the acquisition thread through a [`SourceOpener`],
//! so a backend whose handles cannot cross threads still works.

#[cfg(feature = "camera")]
pub mod camera;
#[cfg(feature = "screen-capture")]
pub mod scrap;
pub mod synthetic;

use std::time::Duration;

use crate::core::frame::{Frame, Size};
use crate::core::run_flag::RunFlag;
use crate::error::{CaptureError, CaptureResult};

pub use synthetic::{Pattern, SyntheticSource};

/// A blocking supplier of frames.
pub trait FrameSource {
    /// Waits for and returns the next frame.
    ///
    /// `Ok(None)` means the source has ended; `Err` is a hard read failure.
    fn read_frame(&mut self) -> CaptureResult<Option<Frame>>;

    /// Human-readable name for logs and diagnostics.
    fn describe(&self) -> String;

    /// Hands the source the pipeline's run flag. A source whose reads can
    /// wait indefinitely returns `Ok(None)` once the flag is cleared.
    fn watch_run_flag(&mut self, _run_flag: &RunFlag) {}
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> CaptureResult<Option<Frame>> {
        (**self).read_frame()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn watch_run_flag(&mut self, run_flag: &RunFlag) {
        (**self).watch_run_flag(run_flag)
    }
}

/// Opens a frame source. Runs on the acquisition thread.
pub type SourceOpener = Box<dyn FnOnce() -> CaptureResult<Box<dyn FrameSource>> + Send>;

/// Which backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Generated test pattern
    Synthetic,
    /// Webcam (`camera` feature)
    Camera,
    /// Live desktop capture (`screen-capture` feature)
    Screen,
}

/// Parameters for [`open_source`].
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Device (or display) index
    pub device_index: usize,
    /// Requested frame size. Advisory; the device decides.
    pub requested: Size,
    /// Synthetic only: end the stream after this many frames
    pub frame_limit: Option<u64>,
    /// Synthetic only: time each read takes
    pub frame_interval: Option<Duration>,
    /// Synthetic only: what to draw
    pub pattern: Pattern,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Synthetic,
            device_index: 0,
            requested: Size::new(640, 480),
            frame_limit: None,
            frame_interval: Some(Duration::from_millis(33)),
            pattern: Pattern::MovingBar,
        }
    }
}

/// Opens the source described by `config`.
///
/// Fails with [`CaptureError::DeviceUnavailable`] when the device cannot be
/// opened or its backend is not compiled in.
pub fn open_source(config: &SourceConfig) -> CaptureResult<Box<dyn FrameSource>> {
    match config.kind {
        SourceKind::Synthetic => {
            if config.device_index != 0 {
                return Err(CaptureError::device_unavailable(
                    format!("synthetic:{}", config.device_index),
                    "only device 0 exists",
                ));
            }
            let mut source = SyntheticSource::pattern(config.requested, config.pattern)?;
            if let Some(limit) = config.frame_limit {
                source = source.with_frame_limit(limit);
            }
            if let Some(interval) = config.frame_interval {
                source = source.with_frame_interval(interval);
            }
            Ok(Box::new(source))
        }
        SourceKind::Camera => open_camera(config),
        SourceKind::Screen => open_screen(config),
    }
}

#[cfg(feature = "camera")]
fn open_camera(config: &SourceConfig) -> CaptureResult<Box<dyn FrameSource>> {
    let source = camera::CameraSource::open(config.device_index, config.requested)?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "camera"))]
fn open_camera(config: &SourceConfig) -> CaptureResult<Box<dyn FrameSource>> {
    Err(CaptureError::device_unavailable(
        format!("camera:{}", config.device_index),
        "camera capture is not compiled in",
    )
    .with_recovery_suggestion("rebuild with --features camera"))
}

#[cfg(feature = "screen-capture")]
fn open_screen(config: &SourceConfig) -> CaptureResult<Box<dyn FrameSource>> {
    let source = scrap::ScreenSource::open(config.device_index, config.requested)?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "screen-capture"))]
fn open_screen(config: &SourceConfig) -> CaptureResult<Box<dyn FrameSource>> {
    Err(CaptureError::device_unavailable(
        format!("screen:{}", config.device_index),
        "screen capture is not compiled in",
    )
    .with_recovery_suggestion("rebuild with --features screen-capture"))
}

/// Wraps `config` in an opener for the acquisition thread.
pub fn opener_for(config: SourceConfig) -> SourceOpener {
    Box::new(move || open_source(&config))
}
