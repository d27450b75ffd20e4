//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::{AppContainer, DefaultAppContainer, LoadOptions};
use crate::cli::args::{StreamsArgs, TrimArgs};
use crate::config_initialization::SnipFixConfig;
use crate::domain::errors::DomainError;
use crate::domain::model::{Artifact, ArtifactSummary};
use crate::error::SnipFixError;
use crate::pipeline::{CutSummary, LoadReport};
use crate::probe::{StreamNameProbe, StreamNameReport};

/// Everything `trim` produced
#[derive(Debug, Serialize)]
struct TrimSummary {
    input: String,
    stream_names: Vec<String>,
    failed_streams: Vec<String>,
    load_artifacts: Vec<ArtifactSummary>,
    cut: CutSummary,
}

/// Execute the streams command
pub fn streams(args: StreamsArgs) -> Result<()> {
    info!("Starting streams operation");
    info!("Input: {}", args.input);

    let report = StreamNameProbe::probe_file(&args.input).context("Failed to scan input file")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize stream names to JSON")?;
        println!("{}", json);
    } else {
        display_stream_names(&report);
    }
    Ok(())
}

/// Execute the trim command
pub async fn trim(args: TrimArgs, config: SnipFixConfig) -> Result<()> {
    info!("Starting trim operation");
    info!("Input: {}", args.input);
    info!("Frames: {}..{}", args.start_frame, args.end_frame);

    // Validate input file exists
    if !Path::new(&args.input).exists() {
        return Err(SnipFixError::InputFileNotFound {
            path: args.input.clone(),
        }
        .into());
    }
    if args.start_frame >= args.end_frame {
        return Err(SnipFixError::InvalidFrameRange {
            start: args.start_frame,
            end: args.end_frame,
        }
        .into());
    }

    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input))?;

    let container = DefaultAppContainer::new(config)?;
    let mut session = container.session()?;

    let load = match session
        .load_video(&bytes, LoadOptions { duration: args.duration })
        .await
    {
        Err(DomainError::NotReady(_)) => {
            return Err(SnipFixError::MissingDuration {
                path: args.input.clone(),
            }
            .into())
        }
        result => result.context("Failed to load video")?,
    };
    for failure in &load.failures {
        warn!("Audio stream {} ({}) skipped: {}", failure.index, failure.name, failure.error);
    }

    let start = session.set_start_bound(args.start_frame)?;
    let end = session.set_end_bound(args.end_frame)?;
    if start != args.start_frame || end != args.end_frame {
        warn!("Frames adjusted to {}..{}", start, end);
    }
    session.release_start_bound().await.context("Keyframe search failed")?;
    session.release_end_bound().await.context("Keyframe search failed")?;

    let cut = session.commit_cut().await.context("Failed to cut video")?;

    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    for artifact in load.artifacts().chain(cut.artifacts()) {
        write_artifact(&args.out_dir, artifact).await?;
    }

    let summary = TrimSummary {
        input: args.input.clone(),
        stream_names: load.stream_names.clone(),
        failed_streams: load.failures.iter().map(|f| f.name.clone()).collect(),
        load_artifacts: load.artifacts().map(Artifact::summary).collect(),
        cut: cut.summary(),
    };
    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize trim report to JSON")?;
        println!("{}", json);
    } else {
        display_trim_summary(&summary, &args.out_dir, &load);
    }

    info!("Trim operation completed successfully");
    Ok(())
}

async fn write_artifact(dir: &Path, artifact: &Artifact) -> Result<()> {
    let path = dir.join(&artifact.file_name);
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .map_err(|e| SnipFixError::OutputError {
            message: format!("{}: {}", path.display(), e),
        })?;
    info!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
    Ok(())
}

/// Display stream names in human-readable format
fn display_stream_names(report: &StreamNameReport) {
    println!("Audio Streams");
    println!("=============");
    println!("File: {}", report.path);
    println!("File Size: {} bytes", report.file_size);
    println!();
    if report.stream_names.is_empty() {
        println!("No named audio streams found");
        return;
    }
    for (i, name) in report.stream_names.iter().enumerate() {
        println!("  Stream {}: {}", i, name);
    }
}

/// Display trim results in human-readable format
fn display_trim_summary(summary: &TrimSummary, out_dir: &Path, load: &LoadReport) {
    println!("Trim Results");
    println!("============");
    println!("Input: {}", summary.input);
    println!(
        "Frames: {}..{} ({:.3}s)",
        summary.cut.start_frame, summary.cut.end_frame, summary.cut.trimmed_duration
    );
    println!(
        "Segment: {:.3}s - {:.3}s",
        summary.cut.segment_start, summary.cut.segment_end
    );
    println!("Bitrate: {} bps", summary.cut.encode_bitrate);
    println!(
        "Audio Streams: {} extracted, {} skipped",
        load.audio_tracks.len(),
        load.failures.len()
    );
    println!();

    println!("Artifacts in {}:", out_dir.display());
    for artifact in summary.load_artifacts.iter().chain(summary.cut.artifacts.iter()) {
        println!("  {} ({}, {} bytes)", artifact.file_name, artifact.mime_type, artifact.size);
    }
}
