// Domain models - Core types and data structures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

pub const MIME_MP4: &str = "video/mp4";
pub const MIME_AAC: &str = "audio/aac";
pub const MIME_WAV: &str = "audio/wav";

/// Work the media engine is currently doing for a session.
///
/// `None` is the only idle state; every other variant marks the session busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Task {
    None,
    Writing,
    FindingKeyframes,
    Rendering,
    Extracting,
    Removing,
    AddingAudio,
    Merging,
}

impl Task {
    /// Check if this task keeps the engine busy
    pub fn is_busy(&self) -> bool {
        !matches!(self, Task::None)
    }

    /// Allowed transitions: idle -> any work, work -> idle.
    pub fn can_transition_to(&self, next: Task) -> bool {
        match (self, next) {
            (Task::None, Task::None) => false,
            (Task::None, _) => true,
            (_, Task::None) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::None => "none",
            Task::Writing => "writing",
            Task::FindingKeyframes => "finding_keyframes",
            Task::Rendering => "rendering",
            Task::Extracting => "extracting",
            Task::Removing => "removing",
            Task::AddingAudio => "adding_audio",
            Task::Merging => "merging",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a track on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackRole {
    Video,
    Audio,
}

/// Output channel of a media engine log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogChannel {
    Out,
    Err,
}

/// One line emitted by the media engine while a command runs
#[derive(Debug, Clone, PartialEq)]
pub struct EngineLog {
    pub channel: LogChannel,
    pub text: String,
}

impl EngineLog {
    pub fn out(text: impl Into<String>) -> Self {
        Self {
            channel: LogChannel::Out,
            text: text.into(),
        }
    }

    pub fn err(text: impl Into<String>) -> Self {
        Self {
            channel: LogChannel::Err,
            text: text.into(),
        }
    }
}

/// Playable payload handed to a media element
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Duration known from metadata, if any
    pub duration_hint: Option<f64>,
}

impl MediaSource {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
            duration_hint: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_hint = Some(seconds);
        self
    }
}

/// Finished payload offered to the user as a download
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub mime_type: String,
    pub label: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        label: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            label: label.into(),
            bytes,
        }
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            label: self.label.clone(),
            size: self.bytes.len() as u64,
        }
    }
}

/// Serializable description of an artifact without its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub file_name: String,
    pub mime_type: String,
    pub label: String,
    pub size: u64,
}

/// Highlighted part of a track between the two bounds, in percent of the
/// track's own duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightRegion {
    pub start_percent: f64,
    pub width_percent: f64,
}

impl HighlightRegion {
    /// Compute the region for bound times against a media duration
    pub fn compute(start_time: f64, end_time: f64, duration: f64) -> Option<Self> {
        if !(duration > 0.0) {
            return None;
        }
        let start_percent = start_time / duration * 100.0;
        let end_percent = end_time / duration * 100.0;
        Some(Self {
            start_percent,
            width_percent: end_percent - start_percent,
        })
    }
}

/// Metadata needed to activate the timeline once the video is loaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaMetadata {
    pub duration: f64,
    pub frame_rate: f64,
}

impl MediaMetadata {
    pub fn new(duration: f64, frame_rate: f64) -> Result<Self, DomainError> {
        if !(duration > 0.0) {
            return Err(DomainError::BadArgs(
                "Media duration must be positive".to_string(),
            ));
        }
        if !(frame_rate > 0.0) {
            return Err(DomainError::BadArgs("Frame rate must be positive".to_string()));
        }
        Ok(Self {
            duration,
            frame_rate,
        })
    }

    /// Number of frames in the media (the last frame has index total - 1)
    pub fn total_frames(&self) -> u64 {
        (self.duration * self.frame_rate).round() as u64
    }
}

/// Time window the keyframe scan covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeSearchWindow {
    pub start: f64,
    pub length: f64,
}
