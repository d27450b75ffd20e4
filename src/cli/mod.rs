//! CLI module for SnipFix
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config_initialization::ConfigOverrides;

pub mod args;
pub mod commands;

pub use args::{StreamsArgs, TrimArgs};

/// SnipFix video trimmer
///
/// Cuts a video between two frames at the nearest keyframes, keeps every
/// named audio stream, and compresses the result to fit a size budget.
#[derive(Parser, Debug)]
#[command(name = "snipfix")]
#[command(about = "SnipFix - Keyframe-aligned video trimming")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level or filter directives (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file with a [snipfix] table
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// ffmpeg executable to run
    #[arg(long, global = true, value_name = "PATH")]
    pub ffmpeg: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the named audio streams of a video file
    Streams(StreamsArgs),
    /// Cut a video between two frames
    Trim(TrimArgs),
}

impl Cli {
    /// Settings given on the command line, highest in the hierarchy
    pub fn config_overrides(&self) -> ConfigOverrides {
        let frame_rate = match &self.command {
            Commands::Trim(args) => args.fps,
            Commands::Streams(_) => None,
        };
        ConfigOverrides {
            frame_rate,
            ffmpeg_path: self.ffmpeg.clone(),
            log_level: self.log_level.clone(),
            json_logs: self.json_logs.then_some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trim() {
        let cli = Cli::try_parse_from([
            "snipfix",
            "--log-level",
            "debug",
            "trim",
            "--input",
            "in.mp4",
            "--start-frame",
            "60",
            "--end-frame",
            "600",
            "--fps",
            "30",
        ])
        .unwrap();
        let overrides = cli.config_overrides();
        assert_eq!(overrides.frame_rate, Some(30.0));
        assert_eq!(overrides.log_level.as_deref(), Some("debug"));
        assert_eq!(overrides.json_logs, None);

        match cli.command {
            Commands::Trim(args) => {
                assert_eq!(args.start_frame, 60);
                assert_eq!(args.end_frame, 600);
                assert_eq!(args.out_dir, PathBuf::from("."));
            }
            _ => panic!("expected trim"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "snipfix",
            "streams",
            "-i",
            "in.mp4",
            "--json",
            "--json-logs",
        ])
        .unwrap();
        assert_eq!(cli.config_overrides().json_logs, Some(true));
        assert_eq!(cli.config_overrides().ffmpeg_path, None);
    }

    #[test]
    fn test_ffmpeg_flag_overrides_path() {
        let cli = Cli::try_parse_from([
            "snipfix",
            "trim",
            "--input",
            "in.mp4",
            "--start-frame",
            "0",
            "--end-frame",
            "60",
            "--ffmpeg",
            "/opt/ffmpeg/bin/ffmpeg",
        ])
        .unwrap();
        let overrides = cli.config_overrides();
        assert_eq!(overrides.ffmpeg_path.as_deref(), Some("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn test_trim_requires_frames() {
        assert!(Cli::try_parse_from(["snipfix", "trim", "--input", "in.mp4"]).is_err());
    }
}
