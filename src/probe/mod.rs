//! Media file inspection

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::{SnipFixError, SnipFixResult};

pub mod stream_names;

pub use stream_names::extract_audio_stream_names;

/// Audio stream titles discovered in one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamNameReport {
    /// File path
    pub path: String,
    /// File size in bytes
    pub file_size: u64,
    /// Titles in stream order
    pub stream_names: Vec<String>,
}

/// Reads a file and scans it for audio stream titles
pub struct StreamNameProbe;

impl StreamNameProbe {
    pub fn probe_bytes(path: &str, bytes: &[u8]) -> StreamNameReport {
        StreamNameReport {
            path: path.to_string(),
            file_size: bytes.len() as u64,
            stream_names: extract_audio_stream_names(bytes),
        }
    }

    pub fn probe_file(path: &str) -> SnipFixResult<StreamNameReport> {
        info!("Scanning {} for audio stream names", path);
        if !Path::new(path).exists() {
            return Err(SnipFixError::InputFileNotFound {
                path: path.to_string(),
            });
        }
        let bytes = std::fs::read(path)?;
        let report = Self::probe_bytes(path, &bytes);
        info!("Found {} audio stream names", report.stream_names.len());
        Ok(report)
    }
}
