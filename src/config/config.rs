//! # Viewer Configuration
//!
//! Plain configuration for a viewer run, shared by the CLI and library
//! callers. Validate it with [`ViewerConfig::validate`], then convert it
//! to the library-level [`SourceConfig`].
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `source` | `SourceKind` | synthetic / camera / screen | Frame source backend |
//! | `device_index` | `usize` | any | Device (display) to open |
//! | `width`, `height` | `u32` | > 0 | Requested frame size; the device may differ |
//! | `timer_period_ms` | `u64` | 1-1000 | Rendering timer period |
//! | `surface` | `SurfaceKind` | window / headless | Where frames are shown |
//! | `duration` | `Option<Duration>` | > 0 | Headless: stop after this long |
//! | `ticks` | `Option<u64>` | > 0 | Headless: stop after this many ticks |
//! | `snapshot` | `Option<PathBuf>` | PNG path | Headless: save the last image shown |
//! | `frame_limit` | `Option<u64>` | any | Synthetic: end of stream after N frames |
//! | `frame_delay_ms` | `u64` | any | Synthetic: time each read takes |
//!
//! ```rust
//! use capview::config::config::{SurfaceKind, ViewerConfig};
//!
//! let mut config = ViewerConfig::default();
//! config.surface = SurfaceKind::Headless;
//! config.ticks = Some(90);
//! assert!(config.validate().is_ok());
//!
//! let source = config.to_source_config();
//! assert_eq!(source.requested.width, 640);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::capture::{Pattern, SourceConfig, SourceKind};
use crate::core::frame::Size;

/// Longest accepted timer period.
pub const MAX_TIMER_PERIOD_MS: u64 = 1000;

/// Where frames are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// A native window (`egui-surface` feature)
    Window,
    /// No window; the timer runs on the calling thread
    Headless,
}

/// Configuration for one viewer run.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub source: SourceKind,
    pub device_index: usize,
    /// Requested width. Advisory.
    pub width: u32,
    /// Requested height. Advisory.
    pub height: u32,
    pub timer_period_ms: u64,
    pub surface: SurfaceKind,
    pub duration: Option<Duration>,
    pub ticks: Option<u64>,
    pub snapshot: Option<PathBuf>,
    pub frame_limit: Option<u64>,
    pub frame_delay_ms: u64,
    pub pattern: Pattern,
}

impl Default for ViewerConfig {
    /// 640x480 synthetic source, 30 ms timer, windowed.
    fn default() -> Self {
        Self {
            source: SourceKind::Synthetic,
            device_index: 0,
            width: 640,
            height: 480,
            timer_period_ms: 30,
            surface: SurfaceKind::Window,
            duration: None,
            ticks: None,
            snapshot: None,
            frame_limit: None,
            frame_delay_ms: 33,
            pattern: Pattern::MovingBar,
        }
    }
}

impl ViewerConfig {
    /// A configuration for `device_index` of `source` at the requested size;
    /// everything else is default.
    pub fn new(source: SourceKind, device_index: usize, width: u32, height: u32) -> Self {
        Self {
            source,
            device_index,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "Frame size must be non-zero, got {}x{}",
                self.width, self.height
            ));
        }
        if !(1..=MAX_TIMER_PERIOD_MS).contains(&self.timer_period_ms) {
            return Err(format!(
                "Timer period must be between 1 and {} ms",
                MAX_TIMER_PERIOD_MS
            ));
        }
        if self.duration.is_some_and(|d| d.is_zero()) {
            return Err("Duration must be greater than 0 seconds".to_string());
        }
        if self.ticks == Some(0) {
            return Err("Tick limit must be greater than 0".to_string());
        }
        if self.surface == SurfaceKind::Window
            && (self.duration.is_some() || self.ticks.is_some() || self.snapshot.is_some())
        {
            return Err(
                "Duration, tick limit and snapshot apply to the headless surface only".to_string(),
            );
        }
        Ok(())
    }

    pub fn timer_period(&self) -> Duration {
        Duration::from_millis(self.timer_period_ms)
    }

    pub fn to_source_config(&self) -> SourceConfig {
        SourceConfig {
            kind: self.source,
            device_index: self.device_index,
            requested: Size::new(self.width, self.height),
            frame_limit: self.frame_limit,
            frame_interval: (self.frame_delay_ms > 0)
                .then(|| Duration::from_millis(self.frame_delay_ms)),
            pattern: self.pattern,
        }
    }
}
