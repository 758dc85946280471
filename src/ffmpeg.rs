//! FFmpeg log level configuration.
//!
//! FFmpeg prints its own diagnostics to stderr independently of the Rust
//! [`log`](https://crates.io/crates/log) facade. Decoding the tail of a
//! truncated file, for instance, can be noisy. These helpers let callers
//! tune that output without importing `ffmpeg-next` themselves.
//!
//! ```no_run
//! use stillframe::FfmpegLogLevel;
//!
//! stillframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use ffmpeg_next::util::log::Level;

/// How much FFmpeg itself writes to stderr, from silent to everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    Quiet,
    Panic,
    Fatal,
    /// Recommended for batch thumbnailing.
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
    Trace,
}

/// Each level with its FFmpeg counterpart and accepted names.
const LEVELS: [(FfmpegLogLevel, Level, &[&str]); 9] = [
    (FfmpegLogLevel::Quiet, Level::Quiet, &["quiet"]),
    (FfmpegLogLevel::Panic, Level::Panic, &["panic"]),
    (FfmpegLogLevel::Fatal, Level::Fatal, &["fatal"]),
    (FfmpegLogLevel::Error, Level::Error, &["error"]),
    (FfmpegLogLevel::Warning, Level::Warning, &["warning", "warn"]),
    (FfmpegLogLevel::Info, Level::Info, &["info"]),
    (FfmpegLogLevel::Verbose, Level::Verbose, &["verbose"]),
    (FfmpegLogLevel::Debug, Level::Debug, &["debug"]),
    (FfmpegLogLevel::Trace, Level::Trace, &["trace"]),
];

impl FfmpegLogLevel {
    fn native(self) -> Level {
        LEVELS
            .iter()
            .find(|(level, ..)| *level == self)
            .map_or(Level::Info, |(_, native, _)| *native)
    }

    /// Parse a level name such as `"warning"` or `"warn"`, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.to_ascii_lowercase();
        LEVELS
            .iter()
            .find(|(.., names)| names.contains(&value.as_str()))
            .map(|(level, ..)| *level)
    }
}

/// Set FFmpeg's internal log level. Does not affect `log` crate output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.native());
}

/// Current FFmpeg log level, or `None` if it maps to no known level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    let native = ffmpeg_next::util::log::get_level().ok()?;
    LEVELS
        .iter()
        .find(|(_, candidate, _)| *candidate == native)
        .map(|(level, ..)| *level)
}
