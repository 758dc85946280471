//! Core [`VideoAsset`] implementation.
//!
//! `VideoAsset` opens a video file, locates its visual track, and caches the
//! track description including the display transform. Frame extraction and
//! orientation lookups run against the open asset; the FFmpeg demuxer is
//! released when the asset is dropped, on success and error paths alike.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use ffmpeg_next::{
    Rational, Stream, codec::context::Context as CodecContext, format::context::Input,
    media::Type,
};
use ffmpeg_sys_next::AVPacketSideDataType;

use crate::{
    configuration::{DecodeWatch, ExtractOptions},
    conversion::pts_to_duration,
    error::StillframeError,
    frame::{ExtractedFrame, FramePosition},
    metadata::VisualTrack,
    orientation::{DISPLAY_MATRIX_SIZE, TransformMatrix, VideoOrientation},
};

/// An open video file.
///
/// Created via [`VideoAsset::open`]. Holds the demuxer context and the
/// cached [`VisualTrack`]. Most callers use the one-shot
/// [`extract_frame`](crate::extract_frame) and
/// [`resolve_orientation`](crate::resolve_orientation) functions instead,
/// which open and drop an asset per call.
///
/// # Example
///
/// ```no_run
/// use stillframe::{FramePosition, StillframeError, VideoAsset};
///
/// let mut asset = VideoAsset::open("portrait.mov")?;
/// println!("orientation: {}", asset.orientation());
///
/// let first = asset.frame(FramePosition::Start, true)?;
/// let last = asset.frame(FramePosition::End, true)?;
/// first.save("first.jpg")?;
/// last.save("last.jpg")?;
/// # Ok::<(), StillframeError>(())
/// ```
pub struct VideoAsset {
    /// The opened FFmpeg input (demuxer) context.
    pub(crate) input_context: Input,
    /// Visual track description read at open time.
    pub(crate) track: VisualTrack,
    /// Path to the opened file (kept for error messages).
    pub(crate) path: PathBuf,
    /// Watch consulted by FFmpeg's I/O interrupt callback; `None` when idle.
    interrupt: Arc<Mutex<Option<DecodeWatch>>>,
}

/// Keeps a watch installed in the interrupt slot until dropped.
pub(crate) struct ArmedInterrupt {
    slot: Arc<Mutex<Option<DecodeWatch>>>,
}

impl Drop for ArmedInterrupt {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

impl Debug for VideoAsset {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoAsset")
            .field("track", &self.track)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl VideoAsset {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, locates the best
    /// video stream, and reads its size, frame rate, duration, and display
    /// transform.
    ///
    /// # Errors
    ///
    /// - [`StillframeError::InvalidReference`] if `path` is missing or is not
    ///   a regular file.
    /// - [`StillframeError::DecodeFailure`] if FFmpeg cannot open the file or
    ///   read the track's codec parameters.
    /// - [`StillframeError::NoVisualTrack`] if the file has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StillframeError> {
        Self::open_watched(path.as_ref(), &DecodeWatch::unbounded())
    }

    /// Open a video file, honouring the deadline and cancellation token in
    /// `options` while the container is probed.
    ///
    /// The deadline covers opening only; each later frame request starts its
    /// own clock.
    ///
    /// # Errors
    ///
    /// As [`open`](VideoAsset::open), plus
    /// [`StillframeError::DeadlineExceeded`] and [`StillframeError::Cancelled`].
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: &ExtractOptions,
    ) -> Result<Self, StillframeError> {
        Self::open_watched(path.as_ref(), &options.start_watch())
    }

    pub(crate) fn open_watched(
        path: &Path,
        watch: &DecodeWatch,
    ) -> Result<Self, StillframeError> {
        let path = path.to_path_buf();
        check_reference(&path)?;
        watch.check()?;

        log::debug!("Opening video asset: {}", path.display());

        ffmpeg_next::init().map_err(|error| {
            StillframeError::decode_failure(&path, format!("FFmpeg initialization failed: {error}"))
        })?;

        let interrupt = Arc::new(Mutex::new(None));
        let input_context = {
            let _armed = arm(&interrupt, watch);
            let callback_slot = Arc::clone(&interrupt);
            let input_context = ffmpeg_next::format::input_with_interrupt(&path, move || {
                interrupted(&callback_slot)
            })
            .map_err(|error| {
                watch.or_tripped(StillframeError::decode_failure(&path, error.to_string()))
            })?;
            watch.check()?;
            input_context
        };

        let track = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(StillframeError::NoVisualTrack)?;
            read_visual_track(&stream, container_duration(&input_context), &path)?
        };

        log::info!(
            "Opened video asset: {} ({}x{} {}, {:.2} fps, {:.2}s, orientation={})",
            path.display(),
            track.width,
            track.height,
            track.codec,
            track.frames_per_second,
            track.duration.as_secs_f64(),
            track.orientation(),
        );

        Ok(Self {
            input_context,
            track,
            path,
            interrupt,
        })
    }

    /// Let FFmpeg abort blocking I/O once `watch` trips, until the returned
    /// guard is dropped.
    pub(crate) fn arm_interrupt(&self, watch: &DecodeWatch) -> ArmedInterrupt {
        arm(&self.interrupt, watch)
    }

    /// The visual track description.
    pub fn visual_track(&self) -> &VisualTrack {
        &self.track
    }

    /// Orientation code of the visual track.
    pub fn orientation(&self) -> VideoOrientation {
        self.track.orientation()
    }

    /// Path the asset was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extract the first or last frame.
    ///
    /// `apply_orientation` controls whether the track transform is baked into
    /// the returned pixels. All other settings use
    /// [`ExtractOptions`] defaults.
    ///
    /// # Errors
    ///
    /// See [`frame_with_options`](VideoAsset::frame_with_options).
    pub fn frame(
        &mut self,
        position: FramePosition,
        apply_orientation: bool,
    ) -> Result<ExtractedFrame, StillframeError> {
        let options = ExtractOptions::new().with_orientation(apply_orientation);
        self.frame_with_options(position, &options)
    }

    /// Extract the first or last frame with explicit options.
    ///
    /// # Errors
    ///
    /// - [`StillframeError::DecodeFailure`] if no frame can be decoded near
    ///   the requested position.
    /// - [`StillframeError::DeadlineExceeded`] or
    ///   [`StillframeError::Cancelled`] when the corresponding option trips.
    pub fn frame_with_options(
        &mut self,
        position: FramePosition,
        options: &ExtractOptions,
    ) -> Result<ExtractedFrame, StillframeError> {
        let watch = options.start_watch();
        crate::frame::extract(self, position, options, &watch)
    }
}

fn arm(slot: &Arc<Mutex<Option<DecodeWatch>>>, watch: &DecodeWatch) -> ArmedInterrupt {
    if let Ok(mut current) = slot.lock() {
        *current = Some(watch.clone());
    }
    ArmedInterrupt {
        slot: Arc::clone(slot),
    }
}

/// FFmpeg polls this during blocking I/O; `true` aborts the call.
fn interrupted(slot: &Mutex<Option<DecodeWatch>>) -> bool {
    slot.lock()
        .map(|current| current.as_ref().is_some_and(DecodeWatch::is_tripped))
        .unwrap_or(false)
}

/// Reject paths that do not name a readable regular file.
fn check_reference(path: &Path) -> Result<(), StillframeError> {
    let metadata = std::fs::metadata(path).map_err(|error| StillframeError::InvalidReference {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;

    if !metadata.is_file() {
        return Err(StillframeError::InvalidReference {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    Ok(())
}

fn container_duration(input_context: &Input) -> Duration {
    let microseconds = input_context.duration();
    if microseconds > 0 {
        Duration::from_micros(microseconds as u64)
    } else {
        Duration::ZERO
    }
}

fn read_visual_track(
    stream: &Stream<'_>,
    fallback_duration: Duration,
    path: &Path,
) -> Result<VisualTrack, StillframeError> {
    let index = stream.index();
    let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
        StillframeError::decode_failure(
            path,
            format!("Failed to read video codec parameters for stream {index}: {error}"),
        )
    })?;
    let video_decoder = decoder_context.decoder().video().map_err(|error| {
        StillframeError::decode_failure(
            path,
            format!("Failed to create video decoder for stream {index}: {error}"),
        )
    })?;

    let as_fps = |rate: Rational| {
        (rate.numerator() > 0 && rate.denominator() > 0)
            .then(|| rate.numerator() as f64 / rate.denominator() as f64)
    };
    let frames_per_second = as_fps(stream.avg_frame_rate())
        .or_else(|| as_fps(stream.rate()))
        .unwrap_or(0.0);

    let stream_duration = stream.duration();
    let duration = if stream_duration > 0 {
        pts_to_duration(stream_duration, stream.time_base())
    } else {
        fallback_duration
    };

    let codec = video_decoder
        .codec()
        .map(|codec| codec.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let transform = read_display_matrix(stream).unwrap_or_default();
    if !transform.is_identity() {
        log::debug!(
            "Stream {index} carries display matrix [{} {} {} {}]",
            transform.a,
            transform.b,
            transform.c,
            transform.d,
        );
    }

    Ok(VisualTrack {
        width: video_decoder.width(),
        height: video_decoder.height(),
        frames_per_second,
        duration,
        codec,
        transform,
        stream_index: index,
    })
}

/// Read the display-matrix side data attached to a stream's codec parameters.
///
/// `ffmpeg-next` does not wrap coded side data, so this reads the raw
/// `AVCodecParameters` the same way the stream's other raw fields are read.
fn read_display_matrix(stream: &Stream<'_>) -> Option<TransformMatrix> {
    let parameters = stream.parameters();

    // SAFETY: `parameters` borrows the stream's live `AVCodecParameters`,
    // which owns `coded_side_data` for as long as the input context is open.
    // Every pointer is null-checked and lengths come from FFmpeg itself.
    unsafe {
        let raw = &*parameters.as_ptr();
        if raw.coded_side_data.is_null() || raw.nb_coded_side_data <= 0 {
            return None;
        }

        let side_data =
            std::slice::from_raw_parts(raw.coded_side_data, raw.nb_coded_side_data as usize);
        let entry = side_data
            .iter()
            .find(|entry| entry.type_ == AVPacketSideDataType::AV_PKT_DATA_DISPLAYMATRIX)?;

        let size = entry.size as usize;
        if entry.data.is_null() || size < DISPLAY_MATRIX_SIZE {
            return None;
        }

        TransformMatrix::from_display_matrix(std::slice::from_raw_parts(entry.data, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_invalid_reference() {
        let error = VideoAsset::open("definitely/not/here.mp4").unwrap_err();
        assert!(error.is_invalid_reference(), "unexpected error: {error}");
    }

    #[test]
    fn directory_is_invalid_reference() {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let error = VideoAsset::open(directory.path()).unwrap_err();
        assert!(
            matches!(&error, StillframeError::InvalidReference { reason, .. } if reason == "not a regular file"),
            "unexpected error: {error}",
        );
    }
}
