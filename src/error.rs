//! Error types for the `stillframe` crate.
//!
//! This module defines [`StillframeError`], the unified error type returned by
//! every fallible operation in the crate. Failures are always surfaced to the
//! caller: no operation returns a blank or placeholder image in place of an
//! error.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `stillframe` operations.
///
/// Callers that want to show a fallback thumbnail can treat any variant as
/// "no preview available"; the variants exist so the reason can be logged or
/// reported.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StillframeError {
    /// The supplied location does not resolve to a readable file.
    #[error("Invalid video reference {path}: {reason}")]
    InvalidReference {
        /// Path that was passed in.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// The asset has no decodable visual stream.
    #[error("No visual track found in video")]
    NoVisualTrack,

    /// The asset could not be opened, or no frame could be produced at the
    /// requested time.
    #[error("Failed to decode {path}: {reason}")]
    DecodeFailure {
        /// Path of the asset being decoded.
        path: PathBuf,
        /// Underlying reason the decode failed.
        reason: String,
    },

    /// Decoding took longer than the configured deadline.
    #[error("Decode deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The operation was cancelled via a
    /// [`CancellationToken`](crate::CancellationToken), or its background
    /// task was lost.
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate, typically while saving a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl StillframeError {
    /// Returns `true` for [`DecodeFailure`](StillframeError::DecodeFailure)
    /// and [`NoVisualTrack`](StillframeError::NoVisualTrack).
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            StillframeError::DecodeFailure { .. } | StillframeError::NoVisualTrack
        )
    }

    /// Returns `true` if the path itself was unusable.
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, StillframeError::InvalidReference { .. })
    }

    pub(crate) fn decode_failure(path: &std::path::Path, reason: impl Into<String>) -> Self {
        StillframeError::DecodeFailure {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl From<FfmpegError> for StillframeError {
    fn from(error: FfmpegError) -> Self {
        StillframeError::FfmpegError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failure_message_names_path() {
        let error = StillframeError::decode_failure(
            std::path::Path::new("clip.mov"),
            "no frame at 4.97s",
        );
        assert_eq!(error.to_string(), "Failed to decode clip.mov: no frame at 4.97s");
        assert!(error.is_decode_failure());
        assert!(!error.is_invalid_reference());
    }

    #[test]
    fn ffmpeg_errors_convert() {
        let error: StillframeError = FfmpegError::Eof.into();
        assert!(matches!(error, StillframeError::FfmpegError(_)));
    }
}
