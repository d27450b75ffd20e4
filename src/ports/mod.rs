// Ports - Interface definitions (contracts)

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Sender half the engine pushes log records into while a command runs
pub type EngineLogSink = UnboundedSender<EngineLog>;

/// Port for the media engine executing transcode, remux and probe commands
#[async_trait]
pub trait MediaEnginePort: Send + Sync {
    /// Run one command to completion, streaming its log lines into `logs`
    async fn run(&self, args: &[String], logs: EngineLogSink) -> Result<(), DomainError>;

    /// Store a file in the engine's namespace
    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), DomainError>;

    /// Read a file back from the engine's namespace
    async fn read_file(&self, name: &str) -> Result<Vec<u8>, DomainError>;
}

/// Port for mixing several encoded audio buffers into one
#[async_trait]
pub trait AudioMixerPort: Send + Sync {
    /// Decode, mix and export the inputs as a single encoded buffer (WAV)
    async fn mix(&self, inputs: Vec<Vec<u8>>) -> Result<Vec<u8>, DomainError>;
}

/// Playable media element backing one timeline track
pub trait MediaElement: Send {
    /// Attach a new source, replacing the previous one
    fn load(&mut self, source: MediaSource);

    /// Duration of the loaded source, once known
    fn duration(&self) -> Option<f64>;

    /// Live playback position in seconds
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    fn play(&mut self);

    fn pause(&mut self);

    fn is_ended(&self) -> bool;

    /// Set output volume in [0, 1]
    fn set_volume(&mut self, volume: f64);
}

/// Port for creating media elements for new tracks
pub trait MediaElementFactory: Send + Sync {
    fn create(&self, role: TrackRole) -> Box<dyn MediaElement>;
}
