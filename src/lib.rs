//! # stillframe
//!
//! Extract correctly oriented first and last frames from video files.
//!
//! Phones and cameras usually store portrait video as a landscape pixel
//! buffer plus a rotation transform in the container. `stillframe` reads that
//! transform, classifies it into a [`VideoOrientation`], and can bake it into
//! the decoded frame so thumbnails come out the right way up. Decoding is done
//! by FFmpeg via [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next);
//! frames are returned as [`image::DynamicImage`] values.
//!
//! ## Quick Start
//!
//! ### Extract a Thumbnail
//!
//! ```no_run
//! use stillframe::FramePosition;
//!
//! let frame = stillframe::extract_frame("input.mov", FramePosition::Start, true).unwrap();
//! frame.save("first_frame.jpg").unwrap();
//! ```
//!
//! ### Resolve Orientation
//!
//! ```no_run
//! let orientation = stillframe::resolve_orientation("input.mov").unwrap();
//! println!("{orientation} (code {})", orientation.code());
//! ```
//!
//! ### Last Frame, Raw Pixels, Bounded Decode Time
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use stillframe::{ExtractOptions, FramePosition};
//!
//! let options = ExtractOptions::new()
//!     .with_orientation(false)
//!     .with_deadline(Duration::from_secs(2));
//! let frame = stillframe::extract_frame_with_options("input.mov", FramePosition::End, &options)
//!     .unwrap();
//! ```
//!
//! ## Features
//!
//! - **First/last frame extraction**: seeks to the nearest keyframe, decodes
//!   forward, and returns the frame closest to the target; the end position
//!   backs off one frame interval from the track duration
//! - **Orientation**: display-matrix decoding and classification into four
//!   codes, plus lossless baking of rotations and mirrors into the pixels
//! - **Explicit failures**: every error is a [`StillframeError`], never a
//!   blank image
//! - **Hardening**: decode deadline and cooperative cancellation
//! - **Output control**: RGB8, RGBA8, or GRAY8; optional downscale to a
//!   maximum edge length
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `extract_frame_async` and `resolve_orientation_async` via Tokio |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

mod asset;
pub mod cancellation;
pub mod configuration;
mod conversion;
pub mod error;
pub mod ffmpeg;
pub mod frame;
pub mod metadata;
pub mod orientation;
pub mod probe;
#[cfg(feature = "async")]
pub mod stream;
pub mod thumbnail;

pub use asset::VideoAsset;
pub use cancellation::CancellationToken;
pub use configuration::{ExtractOptions, PixelFormat};
pub use error::StillframeError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::{ExtractedFrame, FramePosition};
pub use metadata::VisualTrack;
pub use orientation::{PixelTransform, TransformMatrix, VideoOrientation};
pub use probe::{probe, resolve_orientation, resolve_orientation_with_options};
#[cfg(feature = "async")]
pub use stream::{
    BlockingFuture, FrameFuture, OrientationFuture, extract_frame_async,
    resolve_orientation_async,
};
pub use thumbnail::{extract_frame, extract_frame_with_options};
