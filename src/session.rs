//! # Viewer Session
//!
//! Wires the pipeline together and owns its lifecycle:
//!
//! ```text
//! FrameSource ──▶ convert ──▶ LatestFrame ──▶ Presenter ──▶ RenderSurface
//!      (acquisition thread)        │          (rendering thread, timer)
//!                                  └── one slot, latest write wins
//! ```
//!
//! 1. start acquisition and wait for the first frame
//! 2. create the display image at the first frame's size
//! 3. register the presenter on the surface timer and run the event loop
//! 4. when the loop returns: clear the run flag, close the slot, join the
//!    acquisition thread
//!
//! ```rust,no_run
//! use capview::capture::{SourceConfig, opener_for};
//! use capview::render::HeadlessSurface;
//! use capview::session::ViewerSession;
//!
//! let session = ViewerSession::builder()
//!     .with_source_opener(opener_for(SourceConfig::default()))
//!     .build()
//!     .unwrap();
//! let mut surface = HeadlessSurface::new().with_max_ticks(100);
//! let report = session.run(&mut surface).unwrap();
//! println!("{:?}", report);
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::acquisition::{
    AcquisitionStats, FatalHandler, exit_process_handler, spawn_acquisition,
};
use crate::capture::{FrameSource, SourceOpener};
use crate::core::buffer_pool::BufferPool;
use crate::core::frame::Size;
use crate::core::latest_frame::LatestFrame;
use crate::core::run_flag::RunFlag;
use crate::error::{CaptureError, CaptureResult};
use crate::presentation::{
    DEFAULT_REPORT_INTERVAL, DEFAULT_TIMER_PERIOD, Presenter, PresenterStats,
};
use crate::render::RenderSurface;

/// Buffers kept for recycling: one being filled, one in the slot, one spare.
pub const DEFAULT_POOL_CAPACITY: usize = 3;

/// What a finished session did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionReport {
    pub first_frame_size: Size,
    pub presenter: PresenterStats,
    pub acquisition: AcquisitionStats,
}

/// A configured, not yet started, capture-to-display pipeline.
pub struct ViewerSession {
    opener: SourceOpener,
    timer_period: Duration,
    pool_capacity: usize,
    on_fatal: FatalHandler,
    report_interval: Duration,
}

impl ViewerSession {
    pub fn builder() -> ViewerSessionBuilder {
        ViewerSessionBuilder::new()
    }

    pub fn timer_period(&self) -> Duration {
        self.timer_period
    }

    /// Runs the pipeline on `surface` until its event loop returns.
    ///
    /// Fails before the surface is touched if the source cannot be opened
    /// or yields no first frame. After the loop, an acquisition failure
    /// that the fatal handler returned from is reported here.
    pub fn run<S: RenderSurface + ?Sized>(self, surface: &mut S) -> CaptureResult<SessionReport> {
        let latest = Arc::new(LatestFrame::new());
        let run_flag = RunFlag::new();
        let pool = Arc::new(BufferPool::new(self.pool_capacity));

        let acquisition = spawn_acquisition(
            self.opener,
            latest.clone(),
            run_flag.clone(),
            pool,
            self.on_fatal,
        )?;
        let first_frame_size = acquisition.first_frame_size();

        let presenter = Rc::new(RefCell::new(
            Presenter::new(latest.clone()).with_report_interval(self.report_interval),
        ));
        let presented = present(surface, first_frame_size, self.timer_period, &presenter);

        run_flag.stop();
        latest.close();
        surface.shutdown();
        debug!("waiting for the acquisition thread");
        let acquired = acquisition.join();

        presented?;
        let acquisition = acquired?;
        let presenter = presenter.borrow().stats();
        info!(
            "session finished: {} frames read, {} published, {} ticks",
            acquisition.frames_read, acquisition.published, presenter.ticks
        );
        Ok(SessionReport {
            first_frame_size,
            presenter,
            acquisition,
        })
    }
}

fn present<S: RenderSurface + ?Sized>(
    surface: &mut S,
    size: Size,
    period: Duration,
    presenter: &Rc<RefCell<Presenter>>,
) -> CaptureResult<()> {
    surface.create_display_image(size)?;
    let presenter = presenter.clone();
    surface.register_timer(
        period,
        Box::new(move |tick| presenter.borrow_mut().on_tick(tick)),
    )?;
    info!(
        "{} surface showing {} frames, timer every {:?}",
        surface.name(),
        size,
        period
    );
    surface.run_event_loop()
}

/// Builder for [`ViewerSession`].
pub struct ViewerSessionBuilder {
    opener: Option<SourceOpener>,
    timer_period: Duration,
    pool_capacity: usize,
    on_fatal: Option<FatalHandler>,
    report_interval: Duration,
}

impl Default for ViewerSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerSessionBuilder {
    pub fn new() -> Self {
        Self {
            opener: None,
            timer_period: DEFAULT_TIMER_PERIOD,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            on_fatal: None,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }

    /// Opens the source on the acquisition thread. Use this for sources
    /// that cannot cross threads.
    pub fn with_source_opener(mut self, opener: SourceOpener) -> Self {
        self.opener = Some(opener);
        self
    }

    /// Uses an already opened source.
    pub fn with_source<F: FrameSource + Send + 'static>(mut self, source: F) -> Self {
        self.opener = Some(Box::new(move || Ok(Box::new(source) as Box<dyn FrameSource>)));
        self
    }

    pub fn with_timer_period(mut self, period: Duration) -> Self {
        self.timer_period = period;
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Replaces the default handler, which exits the process.
    pub fn with_fatal_handler(mut self, handler: FatalHandler) -> Self {
        self.on_fatal = Some(handler);
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn build(self) -> CaptureResult<ViewerSession> {
        let opener = self.opener.ok_or_else(|| {
            CaptureError::config("source", "none", "a frame source is required")
        })?;
        if self.timer_period.is_zero() {
            return Err(CaptureError::config(
                "timer_period",
                format!("{:?}", self.timer_period),
                "must be greater than zero",
            ));
        }
        Ok(ViewerSession {
            opener,
            timer_period: self.timer_period,
            pool_capacity: self.pool_capacity,
            on_fatal: self.on_fatal.unwrap_or_else(exit_process_handler),
            report_interval: self.report_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::log_only_handler;
    use crate::capture::{Pattern, SyntheticSource};
    use crate::render::HeadlessSurface;

    #[test]
    fn test_build_requires_source() {
        let err = ViewerSession::builder().build().err().unwrap();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_zero_timer_period_rejected() {
        let source = SyntheticSource::pattern(Size::new(2, 2), Pattern::SolidCycle).unwrap();
        let err = ViewerSession::builder()
            .with_source(source)
            .with_timer_period(Duration::ZERO)
            .build()
            .err()
            .unwrap();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_headless_run_shows_frames() {
        let source = SyntheticSource::pattern(Size::new(16, 8), Pattern::SolidCycle)
            .unwrap()
            .with_frame_interval(Duration::from_millis(2));
        let session = ViewerSession::builder()
            .with_source(source)
            .with_timer_period(Duration::from_millis(5))
            .with_fatal_handler(log_only_handler())
            .build()
            .unwrap();
        assert_eq!(session.timer_period(), Duration::from_millis(5));

        let mut surface = HeadlessSurface::new().with_max_ticks(5);
        let report = session.run(&mut surface).unwrap();

        assert_eq!(report.first_frame_size, Size::new(16, 8));
        assert_eq!(report.presenter.ticks, 5);
        assert!(report.presenter.fresh >= 1);
        assert_eq!(report.presenter.empty, 0);
        assert!(report.acquisition.published >= 1);
        assert_eq!(surface.display_image().unwrap().size(), Size::new(16, 8));
    }
}
