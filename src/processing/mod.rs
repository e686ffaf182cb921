//! # Processing Module
//!
//! Per-frame transforms applied on the acquisition thread before a frame is
//! published.

pub mod convert;

pub use convert::{convert, convert_into};
