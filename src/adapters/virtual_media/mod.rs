//! Headless media element adapter
//!
//! Plays nothing: the position advances with the tokio clock while playing,
//! which keeps timeline behavior deterministic under paused test time.

use tokio::time::Instant;

use crate::domain::model::{MediaSource, TrackRole};
use crate::ports::{MediaElement, MediaElementFactory};

/// Media element whose position is derived from elapsed time
#[derive(Debug, Default)]
pub struct VirtualMediaElement {
    source: Option<MediaSource>,
    duration: Option<f64>,
    /// Position at the moment playback last started or was seeked
    anchor_time: f64,
    /// Set while playing
    anchor_instant: Option<Instant>,
    volume: f64,
}

impl VirtualMediaElement {
    pub fn new() -> Self {
        Self {
            volume: 1.0,
            ..Self::default()
        }
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.anchor_instant.is_some()
    }

    fn clamp(&self, seconds: f64) -> f64 {
        let seconds = seconds.max(0.0);
        match self.duration {
            Some(duration) => seconds.min(duration),
            None => seconds,
        }
    }
}

impl MediaElement for VirtualMediaElement {
    fn load(&mut self, source: MediaSource) {
        self.duration = source.duration_hint;
        self.source = Some(source);
        self.anchor_time = 0.0;
        self.anchor_instant = None;
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn current_time(&self) -> f64 {
        let elapsed = self
            .anchor_instant
            .map(|instant| instant.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.clamp(self.anchor_time + elapsed)
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.anchor_time = self.clamp(seconds);
        if self.anchor_instant.is_some() {
            self.anchor_instant = Some(Instant::now());
        }
    }

    fn play(&mut self) {
        if self.source.is_none() || self.anchor_instant.is_some() {
            return;
        }
        if self.is_ended() {
            self.anchor_time = 0.0;
        }
        self.anchor_instant = Some(Instant::now());
    }

    fn pause(&mut self) {
        self.anchor_time = self.current_time();
        self.anchor_instant = None;
    }

    fn is_ended(&self) -> bool {
        match self.duration {
            Some(duration) => self.current_time() >= duration,
            None => false,
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}

/// Factory producing [`VirtualMediaElement`]s for every track role
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualMediaFactory;

impl MediaElementFactory for VirtualMediaFactory {
    fn create(&self, _role: TrackRole) -> Box<dyn MediaElement> {
        Box::new(VirtualMediaElement::new())
    }
}
