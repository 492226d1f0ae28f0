//! FFmpeg console log level.
//!
//! FFmpeg prints its own warnings to stderr independently of the Rust
//! [`log`](https://crates.io/crates/log) facade. Decoding tiny or damaged
//! inputs can be noisy, so the level is exposed here and parsed from the
//! command line via [`FromStr`].
//!
//! ```no_run
//! use framedump::FfmpegLogLevel;
//!
//! framedump::set_ffmpeg_log_level("error".parse::<FfmpegLogLevel>().unwrap());
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use ffmpeg_next::util::log::Level;

/// FFmpeg internal log verbosity, from silent to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output at all.
    Quiet,
    /// Conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Extremely verbose tracing.
    Trace,
}

/// Name, variant and FFmpeg level, in verbosity order.
const LEVELS: [(&str, FfmpegLogLevel, Level); 9] = [
    ("quiet", FfmpegLogLevel::Quiet, Level::Quiet),
    ("panic", FfmpegLogLevel::Panic, Level::Panic),
    ("fatal", FfmpegLogLevel::Fatal, Level::Fatal),
    ("error", FfmpegLogLevel::Error, Level::Error),
    ("warning", FfmpegLogLevel::Warning, Level::Warning),
    ("info", FfmpegLogLevel::Info, Level::Info),
    ("verbose", FfmpegLogLevel::Verbose, Level::Verbose),
    ("debug", FfmpegLogLevel::Debug, Level::Debug),
    ("trace", FfmpegLogLevel::Trace, Level::Trace),
];

impl FfmpegLogLevel {
    /// Lower-case name accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        LEVELS
            .iter()
            .find(|(_, level, _)| *level == self)
            .map(|(name, _, _)| *name)
            .unwrap_or("warning")
    }

    fn to_ffmpeg_level(self) -> Level {
        LEVELS
            .iter()
            .find(|(_, level, _)| *level == self)
            .map(|(_, _, native)| *native)
            .unwrap_or(Level::Warning)
    }

    fn from_ffmpeg_level(native: Level) -> Option<Self> {
        LEVELS
            .iter()
            .find(|(_, _, candidate)| *candidate == native)
            .map(|(_, level, _)| *level)
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        let lowered = if lowered == "warn" {
            "warning".to_string()
        } else {
            lowered
        };
        LEVELS
            .iter()
            .find(|(name, _, _)| *name == lowered)
            .map(|(_, level, _)| *level)
            .ok_or_else(|| {
                let known: Vec<&str> = LEVELS.iter().map(|(name, _, _)| *name).collect();
                format!("unknown log level '{value}' (expected one of {})", known.join(", "))
            })
    }
}

/// Set FFmpeg's console verbosity. Does not affect the `log` facade.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Current FFmpeg console verbosity, if it maps to a known level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .and_then(FfmpegLogLevel::from_ffmpeg_level)
}
