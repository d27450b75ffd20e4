//! SnipFix Video Trimming Library
//!
//! Keyframe-aligned trimming of multi-track videos: a frame-accurate
//! timeline with bounds and a playback clock, and a busy-gated transcode
//! pipeline that drives an ffmpeg-like media engine through extraction,
//! segment rendering, audio merging, remuxing and size-targeted compression.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod probe;
pub mod timeline;

// Re-export commonly used types
pub use app::{LoadOptions, Session, SessionSettings};
pub use config_initialization::SnipFixConfig;
pub use domain::errors::DomainError;
pub use domain::model::{Artifact, Task};
pub use error::{SnipFixError, SnipFixResult};
pub use pipeline::{CutReport, LoadReport, TranscodePipeline};
pub use timeline::{BoundsController, KeyframeIndex, Timeline, TrackSet};
