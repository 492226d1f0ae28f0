use std::{
    error::Error,
    fs,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use framedump::{
    CaptureSummary, ExtractOptions, FfmpegLogLevel, FrameDump, FrameDumpError, ProgressCallback,
    ProgressInfo,
    config::{DEFAULT_MAX_CONSECUTIVE_WRITE_FAILURES, DEFAULT_OUTPUT_DIR, DEFAULT_PREFIX},
};

const CLI_AFTER_HELP: &str = "Examples:\n  framedump input.mp4\n  framedump input.mkv --out frames --prefix shot --progress\n  framedump input.mp4 --log-level quiet --json";

#[derive(Debug, Parser)]
#[command(
    name = "framedump",
    version,
    about = "Write every decoded video frame of a media file as a P6 pixel map",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Media file to extract frames from.
    video_file: PathBuf,

    /// Directory frames are written into. Created if missing.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    out: PathBuf,

    /// File name prefix; frames are named <PREFIX>-<N>.ppm.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<FfmpegLogLevel>,

    /// Show debug logging.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Abort after this many consecutive failed writes (0 never aborts).
    #[arg(long, default_value_t = DEFAULT_MAX_CONSECUTIVE_WRITE_FAILURES)]
    max_write_failures: u32,

    /// Print a machine-readable summary as JSON.
    #[arg(long)]
    json: bool,
}

/// How a finished extraction is reported.
#[derive(Debug)]
enum RunOutcome {
    Completed(CaptureSummary),
    /// Decoding stopped part way; frames written before the error are kept.
    Stopped(FrameDumpError),
}

impl RunOutcome {
    /// Mid-stream decode and conversion errors still count as a run that
    /// produced output. Every other error fails the run.
    fn from_result(result: Result<CaptureSummary, FrameDumpError>) -> Result<Self, FrameDumpError> {
        match result {
            Ok(summary) => Ok(RunOutcome::Completed(summary)),
            Err(error) if error.is_mid_stream() => Ok(RunOutcome::Stopped(error)),
            Err(error) => Err(error),
        }
    }
}

/// Process exit status for the result of [`run`].
fn exit_code<T, E>(result: &Result<T, E>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

struct TerminalProgress {
    bar: Option<ProgressBar>,
    written: AtomicU64,
}

impl TerminalProgress {
    fn new(show: bool, expected_frames: u64) -> Result<Self, Box<dyn Error>> {
        let bar = if show {
            let bar = if expected_frames > 0 {
                let bar = ProgressBar::new(expected_frames);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?;
                bar.set_style(style.progress_chars("##-"));
                bar
            } else {
                ProgressBar::new_spinner()
            };
            Some(bar)
        } else {
            None
        };

        Ok(Self {
            bar,
            written: AtomicU64::new(0),
        })
    }

    fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.written.store(info.frames_written, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            if let Some(total) = info.total {
                bar.set_length(total.max(info.frames_written));
            }
            bar.set_position(info.frames_written);
            bar.set_message(format!("frame {}", info.current_frame));
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "framedump=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn validate_prefix(prefix: &str) -> Result<(), Box<dyn Error>> {
    if prefix.is_empty() {
        return Err("--prefix cannot be empty".into());
    }
    if prefix.contains(['/', '\\']) {
        return Err(format!("--prefix must be a file name, not a path: {prefix}").into());
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    validate_prefix(&cli.prefix)?;

    if let Some(level) = cli.log_level {
        framedump::set_ffmpeg_log_level(level);
    }

    let dump = FrameDump::open(&cli.video_file)?;
    let video = dump.video_stream().clone();
    let session = dump.session();

    if !cli.json {
        println!(
            "{} stream {}: {}x{} [{}]",
            "video".cyan().bold(),
            video.index,
            session.width(),
            session.height(),
            session.codec_name(),
        );
    }

    fs::create_dir_all(&cli.out)?;

    let progress = Arc::new(TerminalProgress::new(cli.progress, video.frame_count)?);
    let options = ExtractOptions::new()
        .with_output_dir(&cli.out)
        .with_prefix(cli.prefix.as_str())
        .with_progress(progress.clone())
        .with_max_consecutive_write_failures(Some(cli.max_write_failures));

    let result = dump.run(&options);
    progress.finish();

    let (summary, aborted) = match RunOutcome::from_result(result)? {
        RunOutcome::Completed(summary) => (Some(summary), None),
        RunOutcome::Stopped(error) => (None, Some(error)),
    };

    if cli.json {
        let payload = json!({
            "input": cli.video_file.display().to_string(),
            "output_dir": cli.out.display().to_string(),
            "video": {
                "stream_index": video.index,
                "codec": video.codec,
                "width": video.width,
                "height": video.height,
                "frames_per_second": video.frames_per_second,
            },
            "frames_written": summary.map_or(progress.written(), |summary| summary.frames_written),
            "frames_decoded": summary.map(|summary| summary.frames_decoded),
            "write_failures": summary.map(|summary| summary.write_failures),
            "packets_read": summary.map(|summary| summary.packets_read),
            "aborted": aborted.as_ref().map(|error| error.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if let Some(error) = &aborted {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("stopped after {} frames: {error}", progress.written()).yellow()
        );
    }

    if let Some(summary) = summary {
        if summary.write_failures > 0 {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("{} frames could not be written", summary.write_failures).yellow()
            );
        }
        println!(
            "{} {} frames to {}",
            "wrote".green().bold(),
            summary.frames_written,
            cli.out.display()
        );
    }

    Ok(())
}

fn main() {
    let result = run();
    if let Err(error) = &result {
        eprintln!("error: {error}");
    }
    std::process::exit(exit_code(&result));
}
