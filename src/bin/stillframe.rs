use std::{path::PathBuf, time::Duration};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use stillframe::{ExtractOptions, FfmpegLogLevel, FramePosition, PixelFormat};

const CLI_AFTER_HELP: &str = "Examples:\n  stillframe orientation clip.mov --json\n  stillframe frame clip.mov --out first.jpg\n  stillframe frame clip.mov --out last.png --position end --max-dimension 320\n  stillframe completions zsh > _stillframe";

#[derive(Debug, Parser)]
#[command(
    name = "stillframe",
    version,
    about = "Extract oriented first/last frames and orientation codes from videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a spinner while decoding.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Pixel format of extracted frames (rgb8, rgba8, gray8).
    #[arg(long, global = true)]
    pixel_format: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the orientation code of a video.
    #[command(
        about = "Print video orientation",
        after_help = "Examples:\n  stillframe orientation clip.mov\n  stillframe orientation clip.mov --json"
    )]
    Orientation {
        /// Input video path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract the first or last frame to an image file.
    #[command(
        about = "Extract a still frame",
        after_help = "Examples:\n  stillframe frame clip.mov --out first.jpg\n  stillframe frame clip.mov --out last.png --position end --raw"
    )]
    Frame {
        /// Input video path.
        input: PathBuf,
        /// Output image path; the format follows the extension.
        #[arg(long)]
        out: PathBuf,
        /// Which frame to extract: start | end.
        #[arg(long, default_value = "start")]
        position: String,
        /// Keep pixels as stored instead of applying the track orientation.
        #[arg(long)]
        raw: bool,
        /// Scale the frame to fit within this many pixels on its longest edge.
        #[arg(long)]
        max_dimension: Option<u32>,
        /// Give up after this many seconds of decoding.
        #[arg(long)]
        timeout: Option<f64>,
    },

    /// Describe the visual track of a video.
    #[command(about = "Print visual track details", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_position(value: &str) -> Option<FramePosition> {
    match value.to_ascii_lowercase().as_str() {
        "start" | "first" => Some(FramePosition::Start),
        "end" | "last" => Some(FramePosition::End),
        _ => None,
    }
}

fn parse_pixel_format(value: &str) -> Option<PixelFormat> {
    match value.to_ascii_lowercase().as_str() {
        "rgb8" | "rgb" => Some(PixelFormat::Rgb8),
        "rgba8" | "rgba" => Some(PixelFormat::Rgba8),
        "gray8" | "gray" | "greyscale" | "grayscale" => Some(PixelFormat::Gray8),
        _ => None,
    }
}

fn parse_timeout(seconds: f64) -> Result<Duration, Box<dyn std::error::Error>> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(
            format!("--timeout must be a positive number of seconds, got {seconds}").into(),
        );
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|error| format!("--timeout {seconds} is out of range: {error}").into())
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(level) = &global.log_level {
        let parsed =
            FfmpegLogLevel::parse(level).ok_or(format!("unsupported --log-level: {level}"))?;
        stillframe::set_ffmpeg_log_level(parsed);
    } else if !global.verbose {
        stillframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);
    }
    Ok(())
}

fn spinner(
    global: &GlobalOptions,
    message: String,
) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !global.progress {
        return Ok(None);
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")?);
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(Some(bar))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Orientation { input, json } => {
            let orientation = stillframe::resolve_orientation(&input)?;
            if json {
                let payload = json!({
                    "path": input.display().to_string(),
                    "orientation": orientation.to_string(),
                    "code": orientation.code(),
                    "degrees": orientation.degrees(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{} (code {})", orientation, orientation.code());
            }
        }
        Commands::Frame {
            input,
            out,
            position,
            raw,
            max_dimension,
            timeout,
        } => {
            let position = parse_position(&position)
                .ok_or(format!("unsupported --position: {position} (expected start or end)"))?;

            if out.exists() {
                if !cli.global.overwrite {
                    return Err(format!(
                        "output already exists: {} (use --overwrite to replace)",
                        out.display()
                    )
                    .into());
                }
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("overwriting {}", out.display()).yellow()
                );
            }

            let mut options = ExtractOptions::new().with_orientation(!raw);
            if let Some(value) = &cli.global.pixel_format {
                let format = parse_pixel_format(value)
                    .ok_or(format!("unsupported --pixel-format: {value}"))?;
                options = options.with_pixel_format(format);
            }
            if let Some(max_dimension) = max_dimension {
                options = options.with_max_dimension(max_dimension);
            }
            if let Some(seconds) = timeout {
                options = options.with_deadline(parse_timeout(seconds)?);
            }

            let bar = spinner(
                &cli.global,
                format!("decoding {:?} frame of {}", position, input.display()),
            )?;
            let result = stillframe::extract_frame_with_options(&input, position, &options);
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }

            let frame = result?;
            frame.save(&out)?;
            println!(
                "{} {}",
                "saved".green().bold(),
                format!(
                    "{} ({}x{} at {:.3}s, {})",
                    out.display(),
                    frame.width(),
                    frame.height(),
                    frame.timestamp.as_secs_f64(),
                    if frame.oriented { "oriented" } else { "raw" },
                )
            );
        }
        Commands::Probe { input, json } => {
            let track = stillframe::probe(&input)?;
            let (display_width, display_height) = track.display_dimensions();
            if json {
                let payload = json!({
                    "path": input.display().to_string(),
                    "codec": track.codec,
                    "width": track.width,
                    "height": track.height,
                    "display_width": display_width,
                    "display_height": display_height,
                    "fps": track.frames_per_second,
                    "duration_seconds": track.duration.as_secs_f64(),
                    "orientation": track.orientation().to_string(),
                    "orientation_code": track.orientation().code(),
                    "transform": [
                        track.transform.a,
                        track.transform.b,
                        track.transform.c,
                        track.transform.d,
                        track.transform.tx,
                        track.transform.ty,
                    ],
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Codec: {}", track.codec);
                println!("Stored: {}x{}", track.width, track.height);
                println!("Displayed: {display_width}x{display_height}");
                println!("Frame rate: {:.2} fps", track.frames_per_second);
                println!("Duration: {:.3}s", track.duration.as_secs_f64());
                println!(
                    "Orientation: {} (code {})",
                    track.orientation(),
                    track.orientation().code()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "stillframe", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Cli, parse_pixel_format, parse_position, parse_timeout};
    use clap::CommandFactory;
    use stillframe::{FramePosition, PixelFormat};

    #[test]
    fn parse_position_aliases() {
        assert_eq!(parse_position("start"), Some(FramePosition::Start));
        assert_eq!(parse_position("FIRST"), Some(FramePosition::Start));
        assert_eq!(parse_position("end"), Some(FramePosition::End));
        assert_eq!(parse_position("last"), Some(FramePosition::End));
        assert_eq!(parse_position("middle"), None);
    }

    #[test]
    fn parse_pixel_format_aliases() {
        assert_eq!(parse_pixel_format("rgb"), Some(PixelFormat::Rgb8));
        assert_eq!(parse_pixel_format("RGBA8"), Some(PixelFormat::Rgba8));
        assert_eq!(parse_pixel_format("greyscale"), Some(PixelFormat::Gray8));
        assert_eq!(parse_pixel_format("yuv420p"), None);
    }

    #[test]
    fn parse_timeout_rejects_non_positive() {
        assert_eq!(parse_timeout(1.5).unwrap(), Duration::from_millis(1_500));
        assert!(parse_timeout(0.0).is_err());
        assert!(parse_timeout(-3.0).is_err());
        assert!(parse_timeout(f64::NAN).is_err());
    }

    #[test]
    fn parse_timeout_rejects_huge_values() {
        let error = parse_timeout(1e20).unwrap_err();
        assert!(error.to_string().contains("out of range"), "{error}");
        assert!(parse_timeout(f64::MAX).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
