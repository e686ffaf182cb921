//! [`JoinOnDrop`]: a [`JoinHandle`] that joins its thread when dropped, so
//! an early return on the rendering thread cannot leave the acquisition
//! thread running unobserved.

use std::thread::{self, JoinHandle};

use crate::error::{CaptureError, CaptureResult};

/// Joins the wrapped thread on drop (RAII style). A panic in the thread is
/// ignored on that path; call [`JoinOnDrop::join`] to observe it.
#[derive(Debug)]
pub struct JoinOnDrop<T>(Option<JoinHandle<T>>);

impl<T> JoinOnDrop<T> {
    pub fn new(handle: JoinHandle<T>) -> Self {
        Self(Some(handle))
    }

    pub fn is_finished(&self) -> bool {
        self.0.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the thread and returns its result.
    pub fn join(mut self) -> thread::Result<T> {
        match self.0.take() {
            Some(handle) => handle.join(),
            None => Err(Box::new("thread already joined")),
        }
    }
}

impl<T> Drop for JoinOnDrop<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            _ = handle.join();
        }
    }
}

/// Spawns a named thread and wraps its handle.
pub fn spawn_named<F, T>(name: &str, f: F) -> CaptureResult<JoinOnDrop<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .map(JoinOnDrop::new)
        .map_err(|e| CaptureError::io(format!("spawn thread '{}'", name), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn test_drop_waits_for_thread() {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        let handle = spawn_named("join-on-drop-test", move || {
            std::thread::sleep(Duration::from_millis(20));
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        drop(handle);
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_join_returns_value() {
        let handle = spawn_named("join-value-test", || 42).unwrap();
        assert_eq!(handle.join().unwrap(), 42);
    }
}
