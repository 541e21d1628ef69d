use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use overlay_telemetry::{
    config::Config,
    error::TelemetryError,
    ocr::TesseractEngine,
    output::{default_output_path, export_name_for, JsModuleWriter},
    progress::ConsoleProgress,
    recognizer::RegionRecognizer,
    telemetry::FrameTelemetryBuilder,
    timecode,
    timeline::{FrameRange, TimelineDriver},
    video::{FfmpegSource, FrameSource, ImageSequenceSource},
};

#[derive(Parser, Debug)]
#[command(
    name = "overlay-telemetry",
    version,
    about = "Extract launch telemetry from a webcast overlay with OCR",
    long_about = "Reads the mission clock, speed and altitude fields of a launch webcast overlay frame by frame, detects liftoff from the clock switching to T+, and writes the readings as a JavaScript array module."
)]
struct Cli {
    /// Video file, or a directory of frame images
    video: PathBuf,

    /// Start time, [[HH:]MM:]SS[.ms] (also accepted as -ss)
    #[arg(long = "ss", value_name = "START")]
    start: Option<String>,

    /// End time, [[HH:]MM:]SS[.ms] (also accepted as -to)
    #[arg(long = "to", value_name = "END")]
    end: Option<String>,

    /// Output file (default: <video name>.js)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Save the cropped regions of the first frame into this directory
    #[arg(long, value_name = "DIR")]
    debug_regions: Option<PathBuf>,

    /// Also write records from before liftoff
    #[arg(long)]
    include_pre_liftoff: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Accept the ffmpeg-style `-ss` / `-to` spellings
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-ss") => OsString::from("--ss"),
            Some("-to") => OsString::from("--to"),
            _ => arg,
        })
        .collect()
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    };

    // Initialize logging; stdout is reserved for the progress line
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            match e.downcast_ref::<TelemetryError>() {
                Some(err) => {
                    eprintln!("{}", err.user_message());
                    err.exit_code()
                }
                None => {
                    eprintln!("Error: {:#}", e);
                    1
                }
            }
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting overlay-telemetry v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    if cli.include_pre_liftoff {
        config.output.include_pre_liftoff = true;
    }
    config.validate()?;

    // Time bounds are parsed before any frame is read
    let start = cli.start.as_deref().map(timecode::parse).transpose().map_err(TelemetryError::from)?;
    let end = cli.end.as_deref().map(timecode::parse).transpose().map_err(TelemetryError::from)?;

    let source = open_source(&cli.video, &config)?;
    let range = FrameRange::from_times(start, end, source.frame_rate());
    range.validate(source.total_frame_count())?;

    let engine = TesseractEngine::new(config.ocr.clone())?;
    let catalog = config.regions.catalog()?;
    let mut builder = FrameTelemetryBuilder::new(
        catalog.clone(),
        RegionRecognizer::new(engine, config.ocr.dpi),
        config.timing.clone(),
    );
    if let Some(dir) = &cli.debug_regions {
        builder = builder.with_debug_dir(dir);
    }

    let output_path = cli.output.clone().unwrap_or_else(|| default_output_path(&cli.video));
    let export_name = config
        .output
        .export_name
        .clone()
        .unwrap_or_else(|| export_name_for(&cli.video));
    let source_name = cli
        .video
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.video.display().to_string());
    let sink = JsModuleWriter::create(&output_path, &export_name, &source_name)?
        .include_pre_liftoff(config.output.include_pre_liftoff);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_on_signal = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current frame");
            stop_on_signal.store(true, Ordering::SeqCst);
        }
    });

    let mut driver = TimelineDriver::new(builder).with_stop_flag(stop);

    // OCR and decoding block; keep them off the async runtime
    let summary = tokio::task::spawn_blocking(move || {
        let mut source = source;
        let mut sink = sink;
        let mut progress = ConsoleProgress::new(std::io::stdout(), &catalog);
        driver.run(source.as_mut(), range, &mut sink, &mut progress)
    })
    .await
    .context("extraction task failed")??;

    if summary.liftoff_frame.is_none() {
        warn!("No liftoff detected; the output contains no post-liftoff records");
    }
    println!("Saved extracted data to {}", output_path.display());
    Ok(())
}

fn open_source(path: &Path, config: &Config) -> overlay_telemetry::Result<Box<dyn FrameSource + Send>> {
    if ImageSequenceSource::is_sequence(path) {
        let fps = config.timing.nominal_fps as f64;
        Ok(Box::new(ImageSequenceSource::open(path, fps)?))
    } else {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn test_legacy_time_flags() {
        let cli = parse(&["overlay-telemetry", "flight.mp4", "-ss", "01:30", "-to", "10:00"]).unwrap();
        assert_eq!(cli.video, PathBuf::from("flight.mp4"));
        assert_eq!(cli.start.as_deref(), Some("01:30"));
        assert_eq!(cli.end.as_deref(), Some("10:00"));
    }

    #[test]
    fn test_missing_video_is_usage_error() {
        let err = parse(&["overlay-telemetry"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_optional_flags() {
        let cli = parse(&[
            "overlay-telemetry", "flight.mp4", "-o", "out.js", "--debug-regions", "dbg", "-v",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("out.js")));
        assert_eq!(cli.debug_regions, Some(PathBuf::from("dbg")));
        assert!(cli.verbose);
        assert!(cli.start.is_none());
    }
}
