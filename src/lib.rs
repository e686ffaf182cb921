//! # capview
//!
//! A live video viewer: frames are captured on one thread, normalized for
//! display, and shown on a periodic timer on another.
//!
//! ## Architecture
//!
//! - `capture`: frame sources (synthetic pattern, desktop capture)
//! - `processing`: BGR to RGB conversion with a vertical flip
//! - `core`: frame model, latest-frame slot, run flag, buffer pool
//! - `acquisition`: the capture thread and its startup handshake
//! - `presentation`: per-tick work on the rendering thread
//! - `render`: rendering surfaces (headless, `egui` window)
//! - `session`: lifecycle orchestration
//! - `config`: configuration and validation
//!
//! ## Threading
//!
//! The two threads meet only at [`core::latest_frame::LatestFrame`], a
//! single mutex-protected slot where the latest write wins. The capture
//! thread never waits for the display and the display never waits for a
//! frame: a slow display skips frames, a slow source repeats one.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use capview::capture::{SourceConfig, opener_for};
//! use capview::render::HeadlessSurface;
//! use capview::session::ViewerSession;
//!
//! let session = ViewerSession::builder()
//!     .with_source_opener(opener_for(SourceConfig::default()))
//!     .with_timer_period(Duration::from_millis(30))
//!     .build()?;
//!
//! let mut surface = HeadlessSurface::new().with_max_duration(Duration::from_secs(2));
//! let report = session.run(&mut surface)?;
//! println!("{} frames shown", report.presenter.fresh);
//! # Ok::<(), capview::CaptureError>(())
//! ```

pub mod acquisition;
pub mod capture;
pub mod config;
pub mod core;
pub mod error;
pub mod presentation;
pub mod processing;
pub mod render;
pub mod session;

/// Re-export error types for convenience
pub use error::{CaptureError, CaptureResult, HasRecoverySuggestion, HasSeverity};

pub use crate::core::frame::{ChannelOrder, Frame, NormalizedFrame, Orientation, Size};
pub use session::{SessionReport, ViewerSession};
