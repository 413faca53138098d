//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use vidchat_cli::settings::ConfigOverrides;

#[derive(Parser)]
#[command(
    name = "vidchat",
    version,
    about = "Retrieve live and replay chat of a video",
    long_about = "Retrieve the chat of a video as a stream of normalized messages.\n\n\
                  Live broadcasts are polled for new comments; finished videos are\n\
                  replayed in fixed time windows. Messages are written to stdout as\n\
                  JSON lines, logs and the run summary go to stderr."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include message text and author names in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Retrieve the chat of a video and write it as JSON lines.
    Fetch(FetchArgs),

    /// List the field rules used to normalize raw records.
    Rules(RulesArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    /// Video URL or numeric video id.
    #[arg(value_name = "VIDEO")]
    pub video: String,

    /// Retrieval settings file (TOML).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Rule override file (TOML) layered over the built-in rules.
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Replay from this offset in seconds. Forces replay mode.
    #[arg(long = "start-time", value_name = "SECONDS")]
    pub start_time: Option<f64>,

    /// Replay up to this offset in seconds. Forces replay mode.
    #[arg(long = "end-time", value_name = "SECONDS")]
    pub end_time: Option<f64>,

    /// Stop after this many messages.
    #[arg(long = "max-messages", value_name = "N")]
    pub max_messages: Option<usize>,

    /// Do not print the run summary.
    #[arg(long = "no-summary")]
    pub no_summary: bool,
}

impl FetchArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            start_time: self.start_time,
            end_time: self.end_time,
            max_messages: self.max_messages,
        }
    }
}

#[derive(Args)]
pub struct RulesArgs {
    /// Rule override file (TOML) to apply before listing.
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
