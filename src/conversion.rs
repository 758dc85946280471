//! Internal conversion helpers.
//!
//! Timestamp rescaling and pixel-data copying shared by the asset and frame
//! modules.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp).
/// `bytes_per_pixel` is 3 for RGB24, 4 for RGBA, 1 for GRAY8.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    strip_padding(
        video_frame.data(0),
        video_frame.stride(0),
        width as usize * bytes_per_pixel,
        height as usize,
    )
}

fn strip_padding(data: &[u8], stride: usize, row_bytes: usize, rows: usize) -> Vec<u8> {
    if stride == row_bytes {
        return data[..row_bytes * rows].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a [`Duration`], clamping negatives to zero.
pub(crate) fn pts_to_duration(pts: i64, time_base: Rational) -> Duration {
    let seconds = pts_to_seconds(pts, time_base);
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f64(seconds)
    } else {
        Duration::ZERO
    }
}

/// Convert a [`Duration`] to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `Input::seek` seeks with `stream_index = -1`, which takes AV_TIME_BASE
/// units regardless of the stream's own time base.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_rescales_with_time_base() {
        let time_base = Rational::new(1, 90_000);
        assert_eq!(pts_to_seconds(45_000, time_base), 0.5);
        assert_eq!(pts_to_duration(180_000, time_base), Duration::from_secs(2));
    }

    #[test]
    fn negative_and_degenerate_pts_clamp_to_zero() {
        assert_eq!(pts_to_duration(-1024, Rational::new(1, 1000)), Duration::ZERO);
        assert_eq!(pts_to_seconds(10, Rational::new(1, 0)), 0.0);
    }

    #[test]
    fn seek_timestamp_is_microseconds() {
        assert_eq!(
            duration_to_seek_timestamp(Duration::from_millis(4_960)),
            4_960_000
        );
    }

    #[test]
    fn padded_rows_are_stripped() {
        // Two rows of 2 RGB pixels, stride padded to 8 bytes.
        let data = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
        assert_eq!(
            strip_padding(&data, 8, 6, 2),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
        );
    }

    #[test]
    fn tight_rows_copy_directly() {
        let data = [1, 2, 3, 4, 5, 6];
        assert_eq!(strip_padding(&data, 3, 3, 2), data.to_vec());
    }
}
