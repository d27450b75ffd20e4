//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the streams command
#[derive(Args, Debug)]
pub struct StreamsArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the trim command
#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// First frame of the kept selection
    #[arg(long)]
    pub start_frame: u64,

    /// Last frame of the kept selection
    #[arg(long)]
    pub end_frame: u64,

    /// Frame rate of the input (default from configuration)
    #[arg(long)]
    pub fps: Option<f64>,

    /// Media duration in seconds, when ffmpeg cannot report it
    #[arg(long)]
    pub duration: Option<f64>,

    /// Directory receiving every artifact
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
