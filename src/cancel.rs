//! Cooperative cancellation for exports.
//!
//! Long-running operations take a token and check it between pages; work
//! inside a single page's unit is never interrupted.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::error::{PagedeckError, Result};

/// Cancellation token checked between pages of an export.
///
/// Clones share the same underlying state, so a UI thread can hold one
/// clone while the export loop holds another.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; all clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with [`PagedeckError::Cancelled`] if cancellation was requested.
    ///
    /// Exports call this at each page boundary.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PagedeckError::Cancelled)
        } else {
            Ok(())
        }
    }
}
