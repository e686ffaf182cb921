//! # Buffer Pool
//!
//! Recycles frame buffers between the acquisition loop and the latest-frame
//! slot, so a running pipeline stops allocating after its first few frames.
//!
//! ```text
//! ┌─────────────┐ get_buffer  ┌─────────────┐  publish   ┌──────────────┐
//! │ Buffer Pool │────────────▶│  Converter  │───────────▶│ Latest Frame │
//! └─────────────┘             └─────────────┘            └──────────────┘
//!        ▲                                                      │
//!        └──────────────── return_buffer (displaced frame) ─────┘
//! ```
//!
//! ```rust
//! use capview::core::buffer_pool::BufferPool;
//!
//! let pool = BufferPool::new(2);
//! let buffer = pool.get_buffer(4 * 4 * 3);
//! assert_eq!(buffer.len(), 48);
//!
//! pool.return_buffer(buffer);
//! assert_eq!(pool.stats(), (1, 2));
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// A bounded pool of reusable byte buffers.
///
/// Buffers come back with whatever contents they last held; every consumer
/// in this crate overwrites the full length before reading.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<VecDeque<Vec<u8>>>,
    max_buffers: usize,
}

impl BufferPool {
    /// Creates an empty pool that keeps at most `max_buffers` spare buffers.
    pub fn new(max_buffers: usize) -> Self {
        Self {
            buffers: Mutex::new(VecDeque::with_capacity(max_buffers)),
            max_buffers,
        }
    }

    /// Takes a buffer of exactly `len` bytes, reusing a pooled one when
    /// available.
    pub fn get_buffer(&self, len: usize) -> Vec<u8> {
        let recycled = self
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match recycled {
            Some(mut buffer) => {
                buffer.resize(len, 0);
                buffer
            }
            None => vec![0u8; len],
        }
    }

    /// Returns a buffer for reuse. Dropped if the pool is already full.
    pub fn return_buffer(&self, buffer: Vec<u8>) {
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        if buffers.len() < self.max_buffers {
            buffers.push_back(buffer);
        }
    }

    /// `(available_buffers, max_buffers)`
    pub fn stats(&self) -> (usize, usize) {
        let buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        (buffers.len(), self.max_buffers)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(3)
    }
}
