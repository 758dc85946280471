//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is attached to an extraction through
//! [`ExtractOptions::with_cancellation`](crate::ExtractOptions::with_cancellation).
//! The decode loop checks it before each demuxed packet.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone the token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any of them to stop the
/// associated extraction with
/// [`StillframeError::Cancelled`](crate::StillframeError::Cancelled).
///
/// # Example
///
/// ```
/// use stillframe::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.clone().cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
