//! One-shot frame extraction.
//!
//! [`extract_frame`] opens the asset, decodes a single frame, and releases the
//! asset before returning. Nothing is cached between calls, so calls for
//! different files can run on different threads at the same time.

use std::path::Path;

use image::{DynamicImage, imageops::FilterType};

use crate::{
    asset::VideoAsset,
    configuration::ExtractOptions,
    error::StillframeError,
    frame::{ExtractedFrame, FramePosition},
};

/// Extract the first or last frame of a video file.
///
/// With `apply_orientation` the track transform is baked into the pixels, so
/// a portrait clip stored as 1920×1080 comes back as 1080×1920. Without it
/// the pixels are returned as stored.
///
/// # Errors
///
/// - [`StillframeError::InvalidReference`] if `path` is not a readable file.
/// - [`StillframeError::NoVisualTrack`] if the file has no video stream.
/// - [`StillframeError::DecodeFailure`] if the file cannot be opened as
///   video or no frame can be decoded near the requested position.
///
/// # Example
///
/// ```no_run
/// use stillframe::{FramePosition, StillframeError};
///
/// let frame = stillframe::extract_frame("portrait.mov", FramePosition::Start, true)?;
/// println!("{}x{}", frame.width(), frame.height());
/// frame.save("preview.jpg")?;
/// # Ok::<(), StillframeError>(())
/// ```
pub fn extract_frame<P: AsRef<Path>>(
    path: P,
    position: FramePosition,
    apply_orientation: bool,
) -> Result<ExtractedFrame, StillframeError> {
    let options = ExtractOptions::new().with_orientation(apply_orientation);
    extract_frame_with_options(path, position, &options)
}

/// Extract the first or last frame with explicit [`ExtractOptions`].
///
/// The deadline, if any, covers opening the container as well as decoding.
///
/// # Errors
///
/// Same as [`extract_frame`], plus [`StillframeError::DeadlineExceeded`] and
/// [`StillframeError::Cancelled`] when those options are set.
pub fn extract_frame_with_options<P: AsRef<Path>>(
    path: P,
    position: FramePosition,
    options: &ExtractOptions,
) -> Result<ExtractedFrame, StillframeError> {
    let watch = options.start_watch();
    let mut asset = VideoAsset::open_watched(path.as_ref(), &watch)?;
    crate::frame::extract(&mut asset, position, options, &watch)
}

/// Scale `image` down to fit within `max_dimension` on its longest edge.
///
/// Images that already fit are returned unchanged.
pub(crate) fn fit_within(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width.max(height) <= max_dimension {
        return image;
    }
    let (thumb_width, thumb_height) = fit_dimensions(width, height, max_dimension);
    log::debug!("Scaling {width}x{height} frame to {thumb_width}x{thumb_height}");
    image.resize_exact(thumb_width, thumb_height, FilterType::Triangle)
}

/// Compute dimensions that fit within `max_dimension` preserving aspect ratio.
fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (max_dimension, max_dimension);
    }
    let scale = max_dimension as f64 / width.max(height) as f64;
    let new_width = ((width as f64) * scale).round() as u32;
    let new_height = ((height as f64) * scale).round() as u32;
    (new_width.max(1), new_height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_dimensions_preserves_aspect() {
        assert_eq!(fit_dimensions(1920, 1080, 640), (640, 360));
        assert_eq!(fit_dimensions(1080, 1920, 640), (360, 640));
        assert_eq!(fit_dimensions(4000, 10, 100), (100, 1));
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let image = DynamicImage::new_rgb8(200, 100);
        let fitted = fit_within(image, 640);
        assert_eq!((fitted.width(), fitted.height()), (200, 100));
    }

    #[test]
    fn large_images_are_downscaled() {
        let image = DynamicImage::new_rgb8(1080, 1920);
        let fitted = fit_within(image, 320);
        assert_eq!((fitted.width(), fitted.height()), (180, 320));
    }
}
