//! # Presentation
//!
//! The consumer half of the pipeline, run from the surface's timer on the
//! rendering thread. Each tick copies the latest frame into the display
//! image (if there is a new one), asks for a redraw, and samples the tick
//! rate for logging.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, trace, warn};

use crate::core::frame_rate::FrameRateMeter;
use crate::core::latest_frame::{Consumed, LatestFrame};
use crate::render::Tick;

/// Default period of the rendering timer.
pub const DEFAULT_TIMER_PERIOD: Duration = Duration::from_millis(30);
/// Default gap between `info` summaries.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Tick counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PresenterStats {
    pub ticks: u64,
    /// Ticks that copied a new frame
    pub fresh: u64,
    /// Ticks that found the frame already shown
    pub repeated: u64,
    /// Ticks before anything was published
    pub empty: u64,
    /// Ticks whose frame was refused for its size
    pub mismatched: u64,
    pub last_fps: Option<f64>,
    pub smoothed_fps: Option<f64>,
}

/// Per-tick work of the presentation timer.
pub struct Presenter {
    latest: Arc<LatestFrame>,
    meter: FrameRateMeter,
    stats: PresenterStats,
    report_interval: Duration,
    last_report: Option<Instant>,
}

impl Presenter {
    pub fn new(latest: Arc<LatestFrame>) -> Self {
        Self {
            latest,
            meter: FrameRateMeter::new(),
            stats: PresenterStats::default(),
            report_interval: DEFAULT_REPORT_INTERVAL,
            last_report: None,
        }
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn stats(&self) -> PresenterStats {
        self.stats
    }

    pub fn on_tick(&mut self, tick: &mut Tick<'_>) {
        self.stats.ticks += 1;
        match self.latest.consume_into(tick.display()) {
            Ok(Consumed::Fresh(sequence)) => {
                self.stats.fresh += 1;
                trace!("tick {}: frame {}", self.stats.ticks, sequence);
            }
            Ok(Consumed::Repeat(_)) => self.stats.repeated += 1,
            Ok(Consumed::Empty) => self.stats.empty += 1,
            Err(e) => {
                self.stats.mismatched += 1;
                warn!("{}; keeping the previous frame", e);
            }
        }
        // Redraw every tick; an unchanged image renders identically.
        tick.request_redraw();

        let now = tick.now();
        if let Some(fps) = self.meter.sample(now) {
            trace!("{:.1} fps", fps);
            self.stats.last_fps = Some(fps);
            self.stats.smoothed_fps = self.meter.smoothed();
        }
        self.maybe_report(now);
    }

    fn maybe_report(&mut self, now: Instant) {
        let last = *self.last_report.get_or_insert(now);
        if now.saturating_duration_since(last) < self.report_interval {
            return;
        }
        self.last_report = Some(now);
        info!(
            "{:.1} fps, {} new / {} repeated frames, latest frame {}",
            self.stats.smoothed_fps.unwrap_or(0.0),
            self.stats.fresh,
            self.stats.repeated,
            self.latest.latest_sequence()
        );
    }
}
