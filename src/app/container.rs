use std::sync::Arc;

use crate::adapters::{FfmpegAmixAdapter, FfmpegProcessEngine, VirtualMediaFactory};
use crate::app::session::{Session, SessionSettings};
use crate::config_initialization::SnipFixConfig;
use crate::domain::errors::DomainError;
use crate::ports::{AudioMixerPort, MediaElementFactory, MediaEnginePort};

pub trait AppContainer: Send + Sync {
    fn config(&self) -> &SnipFixConfig;
    fn session(&self) -> Result<Session, DomainError>;
}

/// Wires sessions to the ffmpeg executable named in the configuration
pub struct DefaultAppContainer {
    config: SnipFixConfig,
}

impl DefaultAppContainer {
    pub fn new(config: SnipFixConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl AppContainer for DefaultAppContainer {
    fn config(&self) -> &SnipFixConfig {
        &self.config
    }

    fn session(&self) -> Result<Session, DomainError> {
        let settings = SessionSettings::from_config(&self.config)?;
        let engine = Arc::new(FfmpegProcessEngine::new(&self.config.ffmpeg_path)?);
        let mixer = Arc::new(FfmpegAmixAdapter::new(&self.config.ffmpeg_path));
        let elements = Arc::new(VirtualMediaFactory);

        Ok(Session::new(
            engine as Arc<dyn MediaEnginePort>,
            mixer as Arc<dyn AudioMixerPort>,
            elements as Arc<dyn MediaElementFactory>,
            settings,
        ))
    }
}
