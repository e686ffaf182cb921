//! Cooperative shutdown flag shared by the rendering and acquisition threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// `true` while the acquisition loop should keep going.
///
/// Starts raised. [`RunFlag::stop`] lowers it exactly once; the store is
/// `Release` and every check is `Acquire`, so whatever the stopping thread
/// did before `stop` is visible to the loop once it sees the flag down.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Requests shutdown. Returns `true` only for the call that actually
    /// lowered the flag.
    pub fn stop(&self) -> bool {
        self.0
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}
