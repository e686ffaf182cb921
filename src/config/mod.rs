//! # Configuration Module
//!
//! Configuration structures and validation for viewer runs.

pub mod config;

pub use config::{SurfaceKind, ViewerConfig};
