//! # Core Infrastructure Module
//!
//! The frame model and the pieces the two pipeline threads share: the
//! latest-frame slot, the run flag, and the buffer pool. Also the
//! frame-rate meter and thread handle used around them.

pub mod buffer_pool;
pub mod frame;
pub mod frame_rate;
pub mod join_on_drop;
pub mod latest_frame;
pub mod run_flag;
