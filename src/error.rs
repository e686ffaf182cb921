//! # Error Handling
//!
//! Error types for the capture-to-display pipeline, with an attached
//! [`ErrorContext`] describing when and where each error occurred.
//!
//! ## Taxonomy
//!
//! - **DeviceUnavailable**: the frame source cannot be opened. Fatal at
//!   startup.
//! - **AcquisitionFailure**: a later read fails ([`CaptureError::FrameCapture`])
//!   or the source ends ([`CaptureError::EndOfStream`]). Fatal, never retried.
//! - **DimensionMismatch**: an acquired frame does not match the display
//!   image. The frame is skipped; the pipeline keeps running.
//!
//! Everything else (configuration, surface, I/O) is reported the usual way.
//!
//! ## Usage
//!
//! ```rust
//! use capview::error::{CaptureError, HasRecoverySuggestion};
//!
//! let error = CaptureError::device_unavailable("synthetic:0", "no such device")
//!     .with_context("opening the frame source")
//!     .with_recovery_suggestion("check the device index");
//!
//! assert!(error.is_fatal());
//! assert_eq!(error.exit_code(), 2);
//! assert_eq!(error.recovery_suggestion(), Some("check the device index"));
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

use crate::core::frame::Size;

/// Exit status for an unavailable capture device.
pub const EXIT_DEVICE_UNAVAILABLE: i32 = 2;
/// Exit status for a failed or exhausted acquisition.
pub const EXIT_ACQUISITION_FAILURE: i32 = 3;
/// Exit status for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Something was dropped or skipped; operation continues
    Warning,
    /// The current operation failed
    Error,
    /// The process cannot continue
    Fatal,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context with the given severity
    pub fn with_severity(severity: ErrorSeverity) -> Self {
        Self {
            severity,
            ..Self::default()
        }
    }
}

/// Base error type for the capture pipeline
#[derive(Debug)]
pub enum CaptureError {
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// The frame source could not be opened
    DeviceUnavailable {
        device: String,
        reason: String,
        context: ErrorContext,
    },
    /// The frame source reported end-of-stream
    EndOfStream {
        frames_read: u64,
        context: ErrorContext,
    },
    /// A frame read failed
    FrameCapture {
        reason: String,
        context: ErrorContext,
    },
    /// A frame does not match the fixed display dimensions
    DimensionMismatch {
        expected: Size,
        actual: Size,
        context: ErrorContext,
    },
    /// A frame's geometry or buffer is unusable
    InvalidFrame {
        reason: String,
        context: ErrorContext,
    },
    /// Rendering surface failures
    Surface {
        surface: String,
        reason: String,
        context: ErrorContext,
    },
    /// State errors (invalid lifecycle transitions)
    State {
        current_state: String,
        attempted_operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// External library errors
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl CaptureError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a device-unavailable error
    pub fn device_unavailable(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            device: device.into(),
            reason: reason.into(),
            context: ErrorContext::with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create an end-of-stream error
    pub fn end_of_stream(frames_read: u64) -> Self {
        Self::EndOfStream {
            frames_read,
            context: ErrorContext::with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create a frame capture error
    pub fn frame_capture(reason: impl Into<String>) -> Self {
        Self::FrameCapture {
            reason: reason.into(),
            context: ErrorContext::with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(expected: Size, actual: Size) -> Self {
        Self::DimensionMismatch {
            expected,
            actual,
            context: ErrorContext::with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create an invalid frame error
    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a rendering surface error
    pub fn surface(surface: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Surface {
            surface: surface.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a state error
    pub fn state(
        current_state: impl Into<String>,
        attempted_operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::State {
            current_state: current_state.into(),
            attempted_operation: attempted_operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an external library error
    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Attach a path to an I/O error. Other variants are returned unchanged.
    pub fn with_path(mut self, new_path: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(new_path.into());
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::DeviceUnavailable { context, .. } => context,
            Self::EndOfStream { context, .. } => context,
            Self::FrameCapture { context, .. } => context,
            Self::DimensionMismatch { context, .. } => context,
            Self::InvalidFrame { context, .. } => context,
            Self::Surface { context, .. } => context,
            Self::State { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::DeviceUnavailable { context, .. } => context,
            Self::EndOfStream { context, .. } => context,
            Self::FrameCapture { context, .. } => context,
            Self::DimensionMismatch { context, .. } => context,
            Self::InvalidFrame { context, .. } => context,
            Self::Surface { context, .. } => context,
            Self::State { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::DeviceUnavailable { .. } => "device_unavailable",
            Self::EndOfStream { .. } | Self::FrameCapture { .. } => "acquisition_failure",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::InvalidFrame { .. } => "invalid_frame",
            Self::Surface { .. } => "surface",
            Self::State { .. } => "state",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
        }
    }

    /// True for end-of-stream and read failures.
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(self, Self::EndOfStream { .. } | Self::FrameCapture { .. })
    }

    /// True when the process cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        classify::is_fatal(self)
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DeviceUnavailable { .. } => EXIT_DEVICE_UNAVAILABLE,
            Self::EndOfStream { .. } | Self::FrameCapture { .. } => EXIT_ACQUISITION_FAILURE,
            _ => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            CaptureError::DeviceUnavailable { device, reason, .. } => {
                write!(f, "Unable to open the device {}: {}", device, reason)
            }
            CaptureError::EndOfStream { frames_read, .. } => {
                write!(
                    f,
                    "Unable to get frames from the device: end of stream after {} frames",
                    frames_read
                )
            }
            CaptureError::FrameCapture { reason, .. } => {
                write!(f, "Unable to get frames from the device: {}", reason)
            }
            CaptureError::DimensionMismatch {
                expected, actual, ..
            } => {
                write!(
                    f,
                    "Frame size {} does not match display size {}",
                    actual, expected
                )
            }
            CaptureError::InvalidFrame { reason, .. } => {
                write!(f, "Invalid frame: {}", reason)
            }
            CaptureError::Surface {
                surface, reason, ..
            } => {
                write!(f, "Rendering surface '{}' failed: {}", surface, reason)
            }
            CaptureError::State {
                current_state,
                attempted_operation,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Invalid state transition from '{}' when attempting '{}': {}",
                    current_state, attempted_operation, reason
                )
            }
            CaptureError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "I/O error during {} on '{}': {}",
                        operation, path, source
                    )
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
            CaptureError::External {
                library, source, ..
            } => {
                write!(f, "External library error in {}: {}", library, source)
            }
        }
    }
}

impl StdError for CaptureError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for CaptureError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for CaptureError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if an error is fatal (the process has to exit)
    pub fn is_fatal(error: &CaptureError) -> bool {
        matches!(
            error,
            CaptureError::DeviceUnavailable { .. }
                | CaptureError::EndOfStream { .. }
                | CaptureError::FrameCapture { .. }
        ) || error.severity() == ErrorSeverity::Fatal
    }

    /// Check if the offending frame is dropped and the pipeline carries on
    pub fn skips_frame(error: &CaptureError) -> bool {
        matches!(
            error,
            CaptureError::DimensionMismatch { .. } | CaptureError::InvalidFrame { .. }
        )
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(error: image::ImageError) -> Self {
        Self::external("image", error)
    }
}

/// Prints the error (and its recovery suggestion, if any) to stderr, then
/// exits the process with [`CaptureError::exit_code`].
#[macro_export]
macro_rules! eprintln_and_exit {
    ($error:expr) => {{
        let error: &$crate::error::CaptureError = &$error;
        eprintln!("{}", error);
        if let Some(suggestion) =
            $crate::error::HasRecoverySuggestion::recovery_suggestion(error)
        {
            eprintln!("hint: {}", suggestion);
        }
        ::std::process::exit(error.exit_code())
    }};
}
