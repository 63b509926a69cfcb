//! CLI argument definitions for the Reference Metadata converter.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "rmd-to-iniz",
    version,
    about = "Convert the Reference Metadata module into Initializer configuration",
    long_about = "Convert the Reference Metadata module (.omod) into Initializer configuration.\n\n\
                  Writes metadata-sharing packages to configuration/metadatasharing and\n\
                  one concept CSV per concept file to configuration/concepts."
)]
pub struct Cli {
    /// Use the numeric concepts file for platform releases before 2.x.
    #[arg(long = "pre2x")]
    pub pre2x: bool,

    /// Path to the Reference Metadata module archive.
    #[arg(value_name = "OMOD")]
    pub omod: PathBuf,

    /// Directory that receives the `configuration` tree.
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
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
