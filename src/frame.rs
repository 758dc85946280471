//! First/last frame extraction.
//!
//! This module provides [`FramePosition`] for choosing which end of the track
//! to sample and [`ExtractedFrame`] for the decoded result. Each extraction
//! creates a fresh decoder, seeks to the keyframe at or before the target
//! time, decodes forward, and keeps the frame whose presentation time is
//! nearest the target.

use std::{
    fs::File,
    io::{BufWriter, Write},
    mem,
    path::Path,
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use ffmpeg_sys_next::AV_NOPTS_VALUE;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};

use crate::{
    asset::VideoAsset,
    configuration::{DecodeWatch, ExtractOptions, PixelFormat},
    conversion::{duration_to_seek_timestamp, frame_to_buffer, pts_to_duration},
    error::StillframeError,
    metadata::VisualTrack,
    orientation::VideoOrientation,
};

/// Which end of the visual track to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FramePosition {
    /// The first decodable frame.
    #[default]
    Start,
    /// The last decodable frame.
    ///
    /// Aims one frame interval before the track duration, since decoders
    /// commonly produce nothing when asked for the exact end timestamp.
    End,
}

impl FramePosition {
    /// Target presentation time on `track`.
    ///
    /// `end_offset` overrides the default back-off of one frame interval for
    /// [`FramePosition::End`]. Never earlier than zero.
    pub fn target_time(self, track: &VisualTrack, end_offset: Option<Duration>) -> Duration {
        match self {
            FramePosition::Start => Duration::ZERO,
            FramePosition::End => {
                let offset = end_offset.unwrap_or_else(|| track.frame_interval());
                track.duration.saturating_sub(offset)
            }
        }
    }
}

/// A decoded still frame.
///
/// Owned by the caller; nothing in the crate keeps a reference to it.
#[derive(Debug, Clone)]
#[must_use]
pub struct ExtractedFrame {
    /// The decoded pixels, oriented if requested.
    pub image: DynamicImage,
    /// Presentation time of the decoded frame, relative to the track start.
    pub timestamp: Duration,
    /// The position that was requested.
    pub position: FramePosition,
    /// Orientation code of the track the frame came from.
    pub orientation: VideoOrientation,
    /// Whether the track transform was baked into [`image`](ExtractedFrame::image).
    pub oriented: bool,
}

impl ExtractedFrame {
    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the frame and return the image.
    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Save the image; the format is inferred from the file extension.
    ///
    /// # Errors
    ///
    /// - [`StillframeError::ImageError`] if the extension names no supported
    ///   format or encoding fails.
    /// - [`StillframeError::IoError`] if the file cannot be created or
    ///   written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StillframeError> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        self.image.write_to(&mut writer, format)?;
        writer.flush()?;
        log::debug!("Saved {}x{} frame to {}", self.width(), self.height(), path.display());
        Ok(())
    }
}

/// Give up on a container after this many consecutive unreadable packets.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// Decode the frame nearest `position` on the asset's visual track.
///
/// `watch` is checked before every packet read and is also armed as FFmpeg's
/// I/O interrupt, so a stalled read aborts once it trips.
pub(crate) fn extract(
    asset: &mut VideoAsset,
    position: FramePosition,
    options: &ExtractOptions,
    watch: &DecodeWatch,
) -> Result<ExtractedFrame, StillframeError> {
    watch.check()?;
    let _armed = asset.arm_interrupt(watch);
    let track = asset.track.clone();
    let target = position.target_time(&track, options.end_offset);

    let stream = asset
        .input_context
        .stream(track.stream_index)
        .ok_or(StillframeError::NoVisualTrack)?;
    let time_base = stream.time_base();
    let start_pts = match stream.start_time() {
        AV_NOPTS_VALUE => 0,
        pts => pts,
    };
    let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
        StillframeError::decode_failure(
            &asset.path,
            format!("Failed to read codec parameters: {error}"),
        )
    })?;
    let mut decoder = decoder_context.decoder().video().map_err(|error| {
        StillframeError::decode_failure(
            &asset.path,
            format!("Failed to create video decoder: {error}"),
        )
    })?;

    // Always seek, even to zero: the asset may have been read before.
    let seek_timestamp =
        duration_to_seek_timestamp(target + pts_to_duration(start_pts, time_base));
    log::debug!(
        "Seeking {} to {:.3}s for {:?} frame",
        asset.path.display(),
        target.as_secs_f64(),
        position,
    );
    asset
        .input_context
        .seek(seek_timestamp, ..seek_timestamp)
        .map_err(|error| {
            watch.or_tripped(StillframeError::decode_failure(
                &asset.path,
                format!("Seek to {:.3}s failed: {error}", target.as_secs_f64()),
            ))
        })?;

    let clock = FrameClock {
        time_base,
        start_pts,
        interval: track.frame_interval(),
    };
    let mut nearest = NearestFrame::new(target);
    let mut decoded_frame = VideoFrame::empty();
    let mut read_errors = 0;

    loop {
        watch.check()?;
        let mut packet = Packet::empty();
        match packet.read(&mut asset.input_context) {
            Ok(()) => read_errors = 0,
            Err(FfmpegError::Eof) => break,
            Err(error) => {
                watch.check()?;
                read_errors += 1;
                if read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                    return Err(StillframeError::decode_failure(
                        &asset.path,
                        format!("Giving up after {read_errors} unreadable packets: {error}"),
                    ));
                }
                log::debug!("Skipping unreadable packet: {error}");
                continue;
            }
        }
        if packet.stream() != track.stream_index {
            continue;
        }

        if let Err(error) = decoder.send_packet(&packet) {
            log::debug!("Skipping undecodable packet: {error}");
            continue;
        }

        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let time = clock.time_of(&decoded_frame, nearest.last_time());
            nearest.offer(time, mem::replace(&mut decoded_frame, VideoFrame::empty()));
        }

        if nearest.is_settled() {
            break;
        }
    }

    if !nearest.is_settled() {
        watch.check()?;
        // A failed flush only means there is nothing buffered.
        if decoder.send_eof().is_ok() {
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let time = clock.time_of(&decoded_frame, nearest.last_time());
                nearest.offer(time, mem::replace(&mut decoded_frame, VideoFrame::empty()));
            }
        }
    }

    let (timestamp, video_frame) = nearest.into_best().ok_or_else(|| {
        StillframeError::decode_failure(
            &asset.path,
            format!(
                "No decodable frame near {:.3}s ({:?})",
                target.as_secs_f64(),
                position
            ),
        )
    })?;

    let mut image = convert_frame(&video_frame, options.pixel_format, &asset.path)?;

    let orientation = track.orientation();
    if options.apply_orientation {
        image = track.transform.pixel_transform().apply(image);
    }
    if let Some(max_dimension) = options.max_dimension {
        image = crate::thumbnail::fit_within(image, max_dimension);
    }

    log::info!(
        "Extracted {:?} frame of {} at {:.3}s ({}x{}, orientation={}, oriented={})",
        position,
        asset.path.display(),
        timestamp.as_secs_f64(),
        image.width(),
        image.height(),
        orientation,
        options.apply_orientation,
    );

    Ok(ExtractedFrame {
        image,
        timestamp,
        position,
        orientation,
        oriented: options.apply_orientation,
    })
}

/// Maps decoded frames to presentation times relative to the track start.
struct FrameClock {
    time_base: Rational,
    start_pts: i64,
    interval: Duration,
}

impl FrameClock {
    /// Frames without any timestamp are placed one interval after the
    /// previous frame.
    fn time_of(&self, frame: &VideoFrame, previous: Option<Duration>) -> Duration {
        match frame.timestamp().or_else(|| frame.pts()) {
            Some(pts) => pts_to_duration(pts.saturating_sub(self.start_pts), self.time_base),
            None => previous.map_or(Duration::ZERO, |time| time + self.interval),
        }
    }
}

/// Keeps the candidate closest to a target time.
///
/// Candidates must arrive in presentation order. Once one at or past the
/// target has been offered, later candidates can only be further away, so
/// the selection is settled. Ties keep the earlier frame.
struct NearestFrame<T> {
    target: Duration,
    best: Option<(Duration, T)>,
    last_time: Option<Duration>,
    settled: bool,
}

impl<T> NearestFrame<T> {
    fn new(target: Duration) -> Self {
        Self {
            target,
            best: None,
            last_time: None,
            settled: false,
        }
    }

    fn offer(&mut self, time: Duration, candidate: T) {
        if self.settled {
            return;
        }
        self.last_time = Some(time);

        let closer = match &self.best {
            None => true,
            Some((best_time, _)) => time.abs_diff(self.target) < best_time.abs_diff(self.target),
        };
        if closer {
            self.best = Some((time, candidate));
        }

        if time >= self.target {
            self.settled = true;
        }
    }

    fn last_time(&self) -> Option<Duration> {
        self.last_time
    }

    fn is_settled(&self) -> bool {
        self.settled
    }

    fn into_best(self) -> Option<(Duration, T)> {
        self.best
    }
}

/// Convert a decoded frame of any pixel format into an image.
///
/// Scaler failures surface as [`StillframeError::FfmpegError`].
fn convert_frame(
    video_frame: &VideoFrame,
    pixel_format: PixelFormat,
    path: &Path,
) -> Result<DynamicImage, StillframeError> {
    let (width, height) = (video_frame.width(), video_frame.height());
    if width == 0 || height == 0 {
        return Err(StillframeError::decode_failure(
            path,
            "Decoded frame has zero dimensions",
        ));
    }

    let mut scaler = ScalingContext::get(
        video_frame.format(),
        width,
        height,
        pixel_format.to_ffmpeg_pixel(),
        width,
        height,
        ScalingFlags::BILINEAR,
    )?;

    let mut converted = VideoFrame::empty();
    scaler.run(video_frame, &mut converted)?;

    let buffer = frame_to_buffer(&converted, width, height, pixel_format.bytes_per_pixel());
    let image = match pixel_format {
        PixelFormat::Rgb8 => RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8),
        PixelFormat::Rgba8 => {
            RgbaImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgba8)
        }
        PixelFormat::Gray8 => {
            GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8)
        }
    };

    image.ok_or_else(|| {
        StillframeError::decode_failure(path, "Failed to construct image from decoded frame data")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::TransformMatrix;

    fn track(duration: Duration, frames_per_second: f64) -> VisualTrack {
        VisualTrack {
            width: 1920,
            height: 1080,
            frames_per_second,
            duration,
            codec: "h264".to_string(),
            transform: TransformMatrix::IDENTITY,
            stream_index: 0,
        }
    }

    fn millis(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn unconvertible_frame_is_ffmpeg_error() {
        let frame = VideoFrame::new(ffmpeg_next::format::Pixel::None, 4, 4);
        let error = convert_frame(&frame, PixelFormat::Rgb8, Path::new("clip.mp4")).unwrap_err();
        assert!(
            matches!(error, StillframeError::FfmpegError(_)),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn empty_frame_is_decode_failure() {
        let error =
            convert_frame(&VideoFrame::empty(), PixelFormat::Rgb8, Path::new("clip.mp4"))
                .unwrap_err();
        assert!(error.is_decode_failure(), "unexpected error: {error:?}");
    }

    #[test]
    fn start_targets_zero() {
        let track = track(Duration::from_secs(5), 25.0);
        assert_eq!(FramePosition::Start.target_time(&track, None), Duration::ZERO);
    }

    #[test]
    fn end_backs_off_one_frame() {
        let track = track(Duration::from_secs(5), 25.0);
        assert_eq!(FramePosition::End.target_time(&track, None), millis(4_960));
    }

    #[test]
    fn end_offset_override_is_used() {
        let track = track(Duration::from_secs(5), 25.0);
        assert_eq!(
            FramePosition::End.target_time(&track, Some(millis(500))),
            millis(4_500)
        );
    }

    #[test]
    fn end_of_empty_track_saturates() {
        let track = track(Duration::ZERO, 30.0);
        assert_eq!(FramePosition::End.target_time(&track, None), Duration::ZERO);
    }

    #[test]
    fn first_frame_settles_start() {
        let mut nearest = NearestFrame::new(Duration::ZERO);
        nearest.offer(millis(40), "first");
        assert!(nearest.is_settled());
        nearest.offer(millis(80), "second");
        assert_eq!(nearest.into_best(), Some((millis(40), "first")));
    }

    #[test]
    fn picks_closest_around_target() {
        let mut nearest = NearestFrame::new(millis(4_960));
        for (time, label) in [(4_800, "a"), (4_900, "b"), (4_950, "c")] {
            nearest.offer(millis(time), label);
        }
        assert!(!nearest.is_settled());
        nearest.offer(millis(5_000), "d");
        assert!(nearest.is_settled());
        assert_eq!(nearest.into_best(), Some((millis(4_950), "c")));
    }

    #[test]
    fn ties_keep_the_earlier_frame() {
        let mut nearest = NearestFrame::new(millis(100));
        nearest.offer(millis(90), "before");
        nearest.offer(millis(110), "after");
        assert_eq!(nearest.into_best(), Some((millis(90), "before")));
    }

    #[test]
    fn track_shorter_than_target_keeps_last_frame() {
        // Stream ends before reaching the target: the last frame wins.
        let mut nearest = NearestFrame::new(millis(10_000));
        nearest.offer(millis(9_000), 1);
        nearest.offer(millis(9_500), 2);
        assert!(!nearest.is_settled());
        assert_eq!(nearest.into_best(), Some((millis(9_500), 2)));
    }

    #[test]
    fn nothing_offered_yields_none() {
        let nearest: NearestFrame<()> = NearestFrame::new(millis(1_000));
        assert!(nearest.into_best().is_none());
    }
}
