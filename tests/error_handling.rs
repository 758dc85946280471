//! Error handling integration tests.
//!
//! These tests verify that every failure is reported as an explicit error
//! rather than an empty result.

use std::path::Path;
use std::time::Duration;

use image::DynamicImage;
use stillframe::{
    CancellationToken, ExtractOptions, ExtractedFrame, FramePosition, StillframeError,
    VideoAsset, VideoOrientation,
};

fn blank_frame() -> ExtractedFrame {
    ExtractedFrame {
        image: DynamicImage::new_rgb8(8, 6),
        timestamp: Duration::ZERO,
        position: FramePosition::Start,
        orientation: VideoOrientation::Up,
        oriented: true,
    }
}

#[test]
fn nonexistent_path_is_invalid_reference() {
    let result = VideoAsset::open("this_file_does_not_exist.mp4");
    let error = result.unwrap_err();
    assert!(error.is_invalid_reference(), "unexpected error: {error:?}");

    let error_message = error.to_string();
    assert!(
        error_message.contains("this_file_does_not_exist.mp4"),
        "Error message should name the path: {error_message}",
    );
}

#[test]
fn directory_is_invalid_reference() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");

    let result = stillframe::resolve_orientation(temporary_directory.path());
    assert!(matches!(
        result,
        Err(StillframeError::InvalidReference { .. })
    ));
}

#[test]
fn garbage_file_is_decode_failure() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let error = stillframe::extract_frame(&invalid_file_path, FramePosition::Start, true)
        .unwrap_err();
    assert!(error.is_decode_failure(), "unexpected error: {error:?}");
    assert!(!error.is_invalid_reference());
}

#[test]
fn empty_file_is_decode_failure() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let empty_file_path = temporary_directory.path().join("empty.mov");
    std::fs::write(&empty_file_path, b"").expect("Failed to write empty file");

    let error = stillframe::resolve_orientation(&empty_file_path).unwrap_err();
    assert!(error.is_decode_failure(), "unexpected error: {error:?}");
}

#[test]
fn audio_only_file_has_no_visual_track() {
    let path = "tests/fixtures/audio_only.m4a";
    if !Path::new(path).exists() {
        return;
    }

    let error = stillframe::resolve_orientation(path).unwrap_err();
    assert!(matches!(error, StillframeError::NoVisualTrack));
    assert!(error.is_decode_failure());

    let error = stillframe::extract_frame(path, FramePosition::End, true).unwrap_err();
    assert!(matches!(error, StillframeError::NoVisualTrack));
}

#[test]
fn error_display() {
    let error = StillframeError::NoVisualTrack;
    assert_eq!(error.to_string(), "No visual track found in video");

    let error = StillframeError::Cancelled;
    assert!(error.to_string().contains("cancelled"));

    let error = StillframeError::FfmpegError("demuxer exploded".to_string());
    assert!(error.to_string().contains("demuxer exploded"));
}

// ── Hardening while opening ─────────────────────────────────────

#[test]
fn cancelled_open_stops_before_decoding() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let token = CancellationToken::new();
    token.cancel();
    let options = ExtractOptions::new().with_cancellation(token);

    let error = VideoAsset::open_with_options(&invalid_file_path, &options).unwrap_err();
    assert!(matches!(error, StillframeError::Cancelled), "unexpected error: {error:?}");

    let error = stillframe::resolve_orientation_with_options(&invalid_file_path, &options)
        .unwrap_err();
    assert!(matches!(error, StillframeError::Cancelled), "unexpected error: {error:?}");
}

#[test]
fn missing_path_wins_over_cancellation() {
    let token = CancellationToken::new();
    token.cancel();
    let options = ExtractOptions::new().with_cancellation(token);

    let error =
        stillframe::extract_frame_with_options("no_such_clip.mov", FramePosition::Start, &options)
            .unwrap_err();
    assert!(error.is_invalid_reference(), "unexpected error: {error:?}");
}

// ── Saving frames ───────────────────────────────────────────────

#[test]
fn save_into_missing_directory_is_io_error() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output_path = temporary_directory.path().join("missing").join("frame.png");

    let error = blank_frame().save(&output_path).unwrap_err();
    assert!(matches!(error, StillframeError::IoError(_)), "unexpected error: {error:?}");
}

#[test]
fn save_with_unknown_extension_is_image_error() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output_path = temporary_directory.path().join("frame.notanimage");

    let error = blank_frame().save(&output_path).unwrap_err();
    assert!(matches!(error, StillframeError::ImageError(_)), "unexpected error: {error:?}");
    assert!(!output_path.exists());
}

#[test]
fn save_writes_png() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output_path = temporary_directory.path().join("frame.png");

    blank_frame().save(&output_path).expect("Failed to save");
    let reloaded = image::open(&output_path).expect("Failed to reload");
    assert_eq!((reloaded.width(), reloaded.height()), (8, 6));
}
