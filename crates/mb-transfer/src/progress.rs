//! Progress reporting for chunk iteration.

use std::sync::Arc;

/// Byte-count progress callback.
///
/// Invoked with `(bytes_done, total_bytes)` after each delivered chunk, on
/// the task driving the iteration. Clones share one callback.
#[derive(Clone)]
pub struct ProgressSender {
    callback: Arc<dyn Fn(u64, u64) + Send + Sync>,
}

impl ProgressSender {
    pub fn new(callback: impl Fn(u64, u64) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// A sender that drops every report.
    pub fn noop() -> Self {
        Self::new(|_, _| {})
    }

    pub fn send(&self, done: u64, total: u64) {
        (self.callback)(done, total);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}
