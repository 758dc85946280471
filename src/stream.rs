//! Async extraction.
//!
//! [`extract_frame_async`] and [`resolve_orientation_async`] run the blocking
//! FFmpeg work on `tokio::task::spawn_blocking` and hand back a future that
//! resolves exactly once, to either the result or an error. Dropping the
//! future does not interrupt the decode; attach a
//! [`CancellationToken`](crate::CancellationToken) through
//! [`ExtractOptions`] for that.
//!
//! # Example
//!
//! ```no_run
//! use stillframe::{ExtractOptions, FramePosition, StillframeError};
//!
//! # async fn example() -> Result<(), StillframeError> {
//! let orientation = stillframe::resolve_orientation_async("clip.mp4").await?;
//! let frame =
//!     stillframe::extract_frame_async("clip.mp4", FramePosition::End, ExtractOptions::new())
//!         .await?;
//! println!("{orientation}: {}x{}", frame.width(), frame.height());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::configuration::ExtractOptions;
use crate::error::StillframeError;
use crate::frame::{ExtractedFrame, FramePosition};
use crate::orientation::VideoOrientation;

/// A single-fire future backed by a blocking task.
///
/// A panicked or aborted task resolves to [`StillframeError::Cancelled`].
pub struct BlockingFuture<T> {
    handle: JoinHandle<Result<T, StillframeError>>,
}

impl<T> Future for BlockingFuture<T> {
    type Output = Result<T, StillframeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|result| {
            result.unwrap_or_else(|error| {
                log::warn!("Blocking extraction task failed: {error}");
                Err(StillframeError::Cancelled)
            })
        })
    }
}

/// Future returned by [`extract_frame_async`].
pub type FrameFuture = BlockingFuture<ExtractedFrame>;

/// Future returned by [`resolve_orientation_async`].
pub type OrientationFuture = BlockingFuture<VideoOrientation>;

/// Extract a frame on a blocking thread.
///
/// Must be called from within a Tokio runtime.
pub fn extract_frame_async<P: AsRef<Path>>(
    path: P,
    position: FramePosition,
    options: ExtractOptions,
) -> FrameFuture {
    let path: PathBuf = path.as_ref().to_path_buf();
    let handle = tokio::task::spawn_blocking(move || {
        crate::thumbnail::extract_frame_with_options(&path, position, &options)
    });
    BlockingFuture { handle }
}

/// Resolve orientation on a blocking thread.
///
/// Must be called from within a Tokio runtime.
pub fn resolve_orientation_async<P: AsRef<Path>>(path: P) -> OrientationFuture {
    let path: PathBuf = path.as_ref().to_path_buf();
    let handle = tokio::task::spawn_blocking(move || crate::probe::resolve_orientation(&path));
    BlockingFuture { handle }
}
