// Adapters - External system implementations

pub mod ffmpeg_mix;
pub mod ffmpeg_process;
pub mod mock;
pub mod toml_config;
pub mod tracing_log;
pub mod virtual_media;

// Re-export adapters
pub use ffmpeg_mix::FfmpegAmixAdapter;
pub use ffmpeg_process::FfmpegProcessEngine;
pub use mock::{MockAudioMixer, MockMediaEngine};
pub use toml_config::TomlConfigAdapter;
pub use tracing_log::TracingLogAdapter;
pub use virtual_media::{VirtualMediaElement, VirtualMediaFactory};
