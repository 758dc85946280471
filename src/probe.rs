//! Orientation resolution and track probing.
//!
//! Both functions open the file, read the visual track description, and
//! close the demuxer before returning. Nothing is decoded.

use std::path::Path;

use crate::{
    asset::VideoAsset, configuration::ExtractOptions, error::StillframeError,
    metadata::VisualTrack, orientation::VideoOrientation,
};

/// Report the orientation code of a video's visual track.
///
/// The result depends only on the track's transform matrix, so repeated
/// calls on an unmodified file return the same code.
///
/// # Errors
///
/// - [`StillframeError::InvalidReference`] if `path` is not a readable file.
/// - [`StillframeError::NoVisualTrack`] if the file has no video stream.
/// - [`StillframeError::DecodeFailure`] if the file cannot be opened.
///
/// # Example
///
/// ```no_run
/// use stillframe::VideoOrientation;
///
/// let orientation = stillframe::resolve_orientation("portrait.mov")?;
/// if orientation == VideoOrientation::Rotated90 {
///     println!("shot in portrait");
/// }
/// println!("code {}", orientation.code());
/// # Ok::<(), stillframe::StillframeError>(())
/// ```
pub fn resolve_orientation<P: AsRef<Path>>(path: P) -> Result<VideoOrientation, StillframeError> {
    resolve_orientation_with_options(path, &ExtractOptions::new())
}

/// [`resolve_orientation`] bounded by the deadline and cancellation token in
/// `options`. Other options are ignored.
///
/// # Errors
///
/// As [`resolve_orientation`], plus [`StillframeError::DeadlineExceeded`] and
/// [`StillframeError::Cancelled`].
pub fn resolve_orientation_with_options<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<VideoOrientation, StillframeError> {
    let asset = VideoAsset::open_with_options(path, options)?;
    let orientation = asset.orientation();
    log::debug!(
        "Resolved orientation of {}: {} (code {})",
        asset.path().display(),
        orientation,
        orientation.code(),
    );
    Ok(orientation)
}

/// Read the visual track description of a video file.
///
/// # Errors
///
/// Same as [`resolve_orientation`].
pub fn probe<P: AsRef<Path>>(path: P) -> Result<VisualTrack, StillframeError> {
    let asset = VideoAsset::open(path)?;
    Ok(asset.track.clone())
}
