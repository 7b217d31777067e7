// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `mrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mrun",
    version,
    about = "Build a set of targets and run their executables concurrently.",
    long_about = None
)]
pub struct CliArgs {
    /// Targets to build and run (e.g. `//tools:serve //tools:watch`).
    #[arg(value_name = "TARGET", required = true)]
    pub targets: Vec<String>,

    /// Display alias for a target, as `TARGET=NAME`. Repeatable.
    ///
    /// Unaliased targets display under their own label.
    #[arg(long, value_name = "TARGET=NAME", value_parser = parse_alias)]
    pub alias: Vec<(String, String)>,

    /// Fixed column width for the per-target output prefix.
    ///
    /// If omitted, the longest display name across all targets is used.
    #[arg(long, value_name = "COLS")]
    pub width: Option<usize>,

    /// Maximum number of targets running at the same time (>= 1).
    ///
    /// If omitted, all targets run at once.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub parallelism: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Extra flags passed through to the build tool, after `--`.
    #[arg(last = true, value_name = "BUILD_ARGS")]
    pub build_args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_alias(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((target, name)) if !target.is_empty() && !name.is_empty() => {
            Ok((target.to_string(), name.to_string()))
        }
        _ => Err(format!("invalid alias '{s}' (expected TARGET=NAME)")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
