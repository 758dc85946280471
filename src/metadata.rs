//! Visual track metadata.
//!
//! [`VisualTrack`] is read once when a [`VideoAsset`](crate::VideoAsset) is
//! opened and cached for the lifetime of the asset.

use std::time::Duration;

use crate::orientation::{TransformMatrix, VideoOrientation};

/// Frame interval assumed when a track does not report its frame rate.
const FALLBACK_FRAME_INTERVAL: Duration = Duration::from_nanos(33_333_333);

/// Description of the visual (video) track of an asset.
///
/// # Example
///
/// ```no_run
/// let track = stillframe::probe("portrait.mov")?;
/// println!(
///     "stored {}x{}, displayed {:?}, {}",
///     track.width,
///     track.height,
///     track.display_dimensions(),
///     track.orientation(),
/// );
/// # Ok::<(), stillframe::StillframeError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct VisualTrack {
    /// Stored (natural) frame width in pixels.
    pub width: u32,
    /// Stored (natural) frame height in pixels.
    pub height: u32,
    /// Frames per second, or `0.0` if unknown.
    pub frames_per_second: f64,
    /// Track duration. Falls back to the container duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"hevc"`).
    pub codec: String,
    /// Transform from stored pixels to displayed pixels.
    pub transform: TransformMatrix,
    /// FFmpeg stream index of the track.
    pub stream_index: usize,
}

impl VisualTrack {
    /// Orientation code derived from [`transform`](VisualTrack::transform).
    pub fn orientation(&self) -> VideoOrientation {
        self.transform.orientation()
    }

    /// `(width, height)` after the transform is applied.
    pub fn display_dimensions(&self) -> (u32, u32) {
        self.transform.display_dimensions(self.width, self.height)
    }

    /// Duration of one frame.
    pub fn frame_interval(&self) -> Duration {
        if self.frames_per_second > 0.0 && self.frames_per_second.is_finite() {
            Duration::from_nanos((1e9 / self.frames_per_second).round() as u64)
        } else {
            FALLBACK_FRAME_INTERVAL
        }
    }
}
