//! Async extraction tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

#![cfg(feature = "async")]

use std::path::Path;

use stillframe::{CancellationToken, ExtractOptions, FramePosition, StillframeError};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";
const ROTATED_VIDEO: &str = "tests/fixtures/rotated_video.mp4";

#[tokio::test]
async fn async_first_frame() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let frame = stillframe::extract_frame_async(
        SAMPLE_VIDEO,
        FramePosition::Start,
        ExtractOptions::new(),
    )
    .await
    .expect("Failed to extract asynchronously");
    assert_eq!((frame.width(), frame.height()), (640, 480));
}

#[tokio::test]
async fn async_matches_blocking() {
    if !Path::new(ROTATED_VIDEO).exists() {
        return;
    }

    let blocking = stillframe::extract_frame(ROTATED_VIDEO, FramePosition::End, true)
        .expect("Failed to extract");
    let asynchronous =
        stillframe::extract_frame_async(ROTATED_VIDEO, FramePosition::End, ExtractOptions::new())
            .await
            .expect("Failed to extract asynchronously");

    assert_eq!(blocking.timestamp, asynchronous.timestamp);
    assert_eq!(blocking.image.as_bytes(), asynchronous.image.as_bytes());

    let orientation = stillframe::resolve_orientation_async(ROTATED_VIDEO)
        .await
        .expect("Failed to resolve asynchronously");
    assert_eq!(orientation, blocking.orientation);
}

#[tokio::test]
async fn concurrent_requests_complete_independently() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let first =
        stillframe::extract_frame_async(SAMPLE_VIDEO, FramePosition::Start, ExtractOptions::new());
    let last =
        stillframe::extract_frame_async(SAMPLE_VIDEO, FramePosition::End, ExtractOptions::new());
    let (first, last) = tokio::join!(first, last);

    let (first, last) = (first.expect("first frame"), last.expect("last frame"));
    assert!(first.timestamp < last.timestamp);
}

#[tokio::test]
async fn async_errors_are_delivered() {
    let result = stillframe::resolve_orientation_async("no_such_video.mov").await;
    assert!(matches!(result, Err(StillframeError::InvalidReference { .. })));
}

#[tokio::test]
async fn async_cancellation() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let token = CancellationToken::new();
    token.cancel();
    let options = ExtractOptions::new().with_cancellation(token);

    let result = stillframe::extract_frame_async(SAMPLE_VIDEO, FramePosition::End, options).await;
    assert!(matches!(result, Err(StillframeError::Cancelled)));
}
