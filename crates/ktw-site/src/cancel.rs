//! Cooperative cancellation for rendering.
//!
//! Rendering checks the token between content items and before each
//! document, never in the middle of one.

use tokio_util::sync::CancellationToken;

/// Shared cancellation flag. Clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    inner: CancellationToken,
}

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}
