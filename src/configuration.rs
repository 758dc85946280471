//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder that carries orientation handling, output
//! format, the end-of-track offset, and hardening settings (deadline,
//! cancellation) into [`extract_frame_with_options`](crate::extract_frame_with_options)
//! and [`VideoAsset::frame_with_options`](crate::VideoAsset::frame_with_options).
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use stillframe::{ExtractOptions, FramePosition, PixelFormat};
//!
//! let options = ExtractOptions::new()
//!     .with_pixel_format(PixelFormat::Rgba8)
//!     .with_max_dimension(320)
//!     .with_deadline(Duration::from_secs(5));
//!
//! let frame = stillframe::extract_frame_with_options("clip.mp4", FramePosition::End, &options)?;
//! frame.image.save("last.png")?;
//! # Ok::<(), stillframe::StillframeError>(())
//! ```

use std::time::{Duration, Instant};

use ffmpeg_next::format::Pixel;

use crate::cancellation::CancellationToken;
use crate::error::StillframeError;

/// Output pixel format for extracted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA with alpha pre-set to 255 (32 bpp).
    Rgba8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Rgba8 => Pixel::RGBA,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Settings for a single frame extraction.
///
/// A default-constructed value applies the track orientation, returns RGB8
/// at full size, backs off one frame interval from the end of the track, and
/// has no deadline.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub(crate) apply_orientation: bool,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) max_dimension: Option<u32>,
    pub(crate) end_offset: Option<Duration>,
    pub(crate) deadline: Option<Duration>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            apply_orientation: true,
            pixel_format: PixelFormat::Rgb8,
            max_dimension: None,
            end_offset: None,
            deadline: None,
            cancellation: None,
        }
    }

    /// Bake the track transform into the returned pixels (`true`, default) or
    /// return the pixels as stored (`false`).
    #[must_use]
    pub fn with_orientation(mut self, apply: bool) -> Self {
        self.apply_orientation = apply;
        self
    }

    /// Set the output pixel format.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Scale the frame to fit within `max_dimension` on its longest edge.
    ///
    /// Applied after orientation. Frames already small enough are left
    /// untouched. Zero is ignored.
    #[must_use]
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = (max_dimension > 0).then_some(max_dimension);
        self
    }

    /// Override how far before the end of the track
    /// [`FramePosition::End`](crate::FramePosition::End) aims.
    ///
    /// Defaults to one frame interval.
    #[must_use]
    pub fn with_end_offset(mut self, offset: Duration) -> Self {
        self.end_offset = Some(offset);
        self
    }

    /// Fail with [`StillframeError::DeadlineExceeded`] if decoding takes
    /// longer than `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Whether the track transform will be applied.
    pub fn applies_orientation(&self) -> bool {
        self.apply_orientation
    }

    /// Start the clock for deadline and cancellation checks.
    pub(crate) fn start_watch(&self) -> DecodeWatch {
        DecodeWatch {
            started: Instant::now(),
            deadline: self.deadline,
            cancellation: self.cancellation.clone(),
        }
    }
}

/// Deadline and cancellation state for one open-and-decode run.
///
/// Owned and cheap to clone, so a copy can sit inside FFmpeg's I/O interrupt
/// callback while the decode loop polls another.
#[derive(Debug, Clone)]
pub(crate) struct DecodeWatch {
    started: Instant,
    deadline: Option<Duration>,
    cancellation: Option<CancellationToken>,
}

impl DecodeWatch {
    /// A watch that never trips.
    pub(crate) fn unbounded() -> Self {
        Self {
            started: Instant::now(),
            deadline: None,
            cancellation: None,
        }
    }

    /// Whether the deadline has passed or cancellation was requested.
    pub(crate) fn is_tripped(&self) -> bool {
        self.check().is_err()
    }

    /// Returns an error once the deadline has passed or cancellation was
    /// requested.
    pub(crate) fn check(&self) -> Result<(), StillframeError> {
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Err(StillframeError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if self.started.elapsed() > deadline => {
                Err(StillframeError::DeadlineExceeded(deadline))
            }
            _ => Ok(()),
        }
    }

    /// Prefer the watch's own error over `fallback`. FFmpeg reports an
    /// interrupted call as a generic failure.
    pub(crate) fn or_tripped(&self, fallback: StillframeError) -> StillframeError {
        self.check().err().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_orientation() {
        let options = ExtractOptions::default();
        assert!(options.applies_orientation());
        assert_eq!(options.pixel_format, PixelFormat::Rgb8);
        assert!(options.max_dimension.is_none());
        assert!(options.end_offset.is_none());
    }

    #[test]
    fn watch_trips_after_deadline() {
        let watch = ExtractOptions::new()
            .with_deadline(Duration::from_millis(1))
            .start_watch();
        std::thread::sleep(Duration::from_millis(5));
        assert!(matches!(
            watch.or_tripped(StillframeError::NoVisualTrack),
            StillframeError::DeadlineExceeded(_)
        ));
    }

    #[test]
    fn untripped_watch_keeps_fallback() {
        let watch = DecodeWatch::unbounded();
        assert!(!watch.is_tripped());
        assert!(matches!(
            watch.or_tripped(StillframeError::NoVisualTrack),
            StillframeError::NoVisualTrack
        ));
    }

    #[test]
    fn zero_max_dimension_is_ignored() {
        assert!(ExtractOptions::new().with_max_dimension(0).max_dimension.is_none());
        assert_eq!(
            ExtractOptions::new().with_max_dimension(256).max_dimension,
            Some(256)
        );
    }

    #[test]
    fn cancelled_token_trips_watch() {
        let token = CancellationToken::new();
        let options = ExtractOptions::new().with_cancellation(token.clone());
        let watch = options.start_watch();
        assert!(watch.check().is_ok());

        token.cancel();
        assert!(matches!(watch.check(), Err(StillframeError::Cancelled)));
    }

    #[test]
    fn zero_deadline_expires() {
        let options = ExtractOptions::new().with_deadline(Duration::ZERO);
        let watch = options.start_watch();
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(
            watch.check(),
            Err(StillframeError::DeadlineExceeded(_))
        ));
    }

    #[test]
    fn pixel_formats_report_byte_width() {
        assert_eq!(PixelFormat::Rgb8.bytes_per_pixel(), 3);
        assert_eq!(PixelFormat::Rgba8.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::Gray8.bytes_per_pixel(), 1);
    }
}
