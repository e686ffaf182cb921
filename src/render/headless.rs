//! Windowless rendering surface.
//!
//! Runs the timer on the calling thread at a fixed cadence until a tick
//! limit, a time limit, or a [`SurfaceCloser`] ends the loop. Ticks that
//! fall behind are not replayed; the next deadline is rescheduled from now.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::core::frame::Size;
use crate::error::{CaptureError, CaptureResult};
use crate::render::{DisplayImage, RenderSurface, Tick, TimerCallback};

const NAME: &str = "headless";

/// Closes a [`HeadlessSurface`] from any thread, like a user closing the
/// window.
#[derive(Debug, Clone, Default)]
pub struct SurfaceCloser(Arc<AtomicBool>);

impl SurfaceCloser {
    pub fn close(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Default)]
pub struct HeadlessSurface {
    display: Option<DisplayImage>,
    timer: Option<(Duration, TimerCallback)>,
    max_ticks: Option<u64>,
    max_duration: Option<Duration>,
    closer: SurfaceCloser,
    ticks: u64,
    redraws: u64,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ends the event loop after `ticks` timer ticks.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Ends the event loop once `duration` has passed.
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    pub fn closer(&self) -> SurfaceCloser {
        self.closer.clone()
    }

    pub fn display_image(&self) -> Option<&DisplayImage> {
        self.display.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks whose callback asked for a redraw.
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    fn should_stop(&self, started: Instant) -> bool {
        self.closer.is_closed()
            || self.max_ticks.is_some_and(|max| self.ticks >= max)
            || self
                .max_duration
                .is_some_and(|max| started.elapsed() >= max)
    }
}

impl RenderSurface for HeadlessSurface {
    fn create_display_image(&mut self, size: Size) -> CaptureResult<()> {
        if self.display.is_some() {
            return Err(CaptureError::state(
                "display image created",
                "create_display_image",
                "the display image size is fixed once created",
            ));
        }
        self.display = Some(DisplayImage::new(size)?);
        Ok(())
    }

    fn register_timer(&mut self, period: Duration, callback: TimerCallback) -> CaptureResult<()> {
        if period.is_zero() {
            return Err(CaptureError::config(
                "timer_period",
                format!("{:?}", period),
                "must be greater than zero",
            ));
        }
        self.timer = Some((period, callback));
        Ok(())
    }

    fn run_event_loop(&mut self) -> CaptureResult<()> {
        let Some((period, mut callback)) = self.timer.take() else {
            return Err(CaptureError::state(
                "no timer",
                "run_event_loop",
                "register a timer first",
            ));
        };
        if self.display.is_none() {
            return Err(CaptureError::state(
                "no display image",
                "run_event_loop",
                "create the display image first",
            ));
        }

        let started = Instant::now();
        let mut deadline = started + period;
        while !self.should_stop(started) {
            let now = Instant::now();
            if now < deadline {
                thread::sleep(deadline - now);
                continue;
            }
            deadline = (deadline + period).max(now);

            let Some(display) = self.display.as_mut() else {
                break;
            };
            let mut tick = Tick::new(display, Instant::now());
            callback(&mut tick);
            self.ticks += 1;
            if tick.redraw_requested() {
                self.redraws += 1;
            }
        }
        debug!(
            "{} event loop ended after {} ticks ({} redraws)",
            NAME, self.ticks, self.redraws
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        self.closer.close();
        self.timer = None;
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
