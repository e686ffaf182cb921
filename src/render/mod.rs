//! # Render Module
//!
//! The rendering side of the pipeline: a [`RenderSurface`] owns the display
//! image and the event loop, and drives a periodic timer callback from it.
//!
//! ## Surfaces
//!
//! - [`headless::HeadlessSurface`]: fixed-cadence loop on the calling thread,
//!   no window. Used by tests and `--surface headless`.
//! - `window::EguiSurface` (`egui-surface` feature): an `eframe` window.
//!
//! The display image is stored bottom-up; a surface that draws with a
//! top-left origin flips it when drawing, never in memory.

pub mod display_image;
pub mod headless;
#[cfg(feature = "egui-surface")]
pub mod window;

use std::time::{Duration, Instant};

use crate::core::frame::Size;
use crate::error::CaptureResult;

pub use display_image::DisplayImage;
pub use headless::{HeadlessSurface, SurfaceCloser};
#[cfg(feature = "egui-surface")]
pub use window::EguiSurface;

/// Called by the surface on every timer tick, on the rendering thread.
pub type TimerCallback = Box<dyn FnMut(&mut Tick<'_>)>;

/// What a timer callback gets to work with during one tick.
pub struct Tick<'a> {
    display: &'a mut DisplayImage,
    now: Instant,
    redraw: bool,
}

impl<'a> Tick<'a> {
    pub fn new(display: &'a mut DisplayImage, now: Instant) -> Self {
        Self {
            display,
            now,
            redraw: false,
        }
    }

    /// The surface's display image.
    pub fn display(&mut self) -> &mut DisplayImage {
        self.display
    }

    /// When the tick fired.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Asks the surface to redraw once the callback returns.
    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    pub fn redraw_requested(&self) -> bool {
        self.redraw
    }
}

/// A window (or stand-in) that shows a [`DisplayImage`].
///
/// Calls arrive in order: `create_display_image`, `register_timer`,
/// `run_event_loop`, then `shutdown`. Everything runs on the thread that
/// owns the surface.
pub trait RenderSurface {
    /// Allocates the blank display image. Its size is fixed from here on.
    fn create_display_image(&mut self, size: Size) -> CaptureResult<()>;

    /// Arranges for `callback` to run roughly every `period` while the event
    /// loop runs.
    fn register_timer(&mut self, period: Duration, callback: TimerCallback) -> CaptureResult<()>;

    /// Blocks until the surface is closed.
    fn run_event_loop(&mut self) -> CaptureResult<()>;

    /// Releases surface resources. Safe to call more than once.
    fn shutdown(&mut self);

    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;
}
