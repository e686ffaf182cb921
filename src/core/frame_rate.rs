//! # Frame-Rate Meter
//!
//! Turns tick timestamps into frames-per-second figures for logging. The
//! numbers are observability only; nothing in the pipeline is paced by
//! them.

use std::time::{Duration, Instant};

/// Weight given to the newest sample in the smoothed rate.
const SMOOTHING: f64 = 0.1;

/// Instantaneous and smoothed frame rate from successive ticks.
#[derive(Debug, Clone, Default)]
pub struct FrameRateMeter {
    previous: Option<Instant>,
    instantaneous: Option<f64>,
    smoothed: Option<f64>,
    samples: u64,
}

impl FrameRateMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a tick at `now` and returns the instantaneous rate.
    ///
    /// Returns `None` for the very first tick (there is no previous
    /// timestamp) and when no time has passed since the previous tick.
    pub fn sample(&mut self, now: Instant) -> Option<f64> {
        let previous = self.previous.replace(now)?;
        let elapsed = now.saturating_duration_since(previous);
        let fps = rate_for(elapsed)?;

        self.samples += 1;
        self.instantaneous = Some(fps);
        self.smoothed = Some(match self.smoothed {
            Some(avg) => avg + SMOOTHING * (fps - avg),
            None => fps,
        });
        Some(fps)
    }

    /// The most recent instantaneous rate.
    pub fn instantaneous(&self) -> Option<f64> {
        self.instantaneous
    }

    /// Exponentially smoothed rate over all samples so far.
    pub fn smoothed(&self) -> Option<f64> {
        self.smoothed
    }

    /// Number of valid rate samples taken.
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

fn rate_for(elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    (secs > 0.0).then(|| 1.0 / secs)
}
