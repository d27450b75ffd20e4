// Session - one editing session over one uploaded video

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config_initialization::SnipFixConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::BitratePolicy;
use crate::pipeline::files::SILENCED_INPUT;
use crate::pipeline::{CutReport, LoadReport, TranscodePipeline};
use crate::ports::*;
use crate::timeline::keyframes::KEYFRAME_DISTANCE_WARNING_SECS;
use crate::timeline::{SharedTimeline, Timeline, Transport};

/// Name of the track showing the silenced video
pub const VIDEO_TRACK_NAME: &str = "Video";

/// Session-wide settings, fixed for the session's life
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub frame_rate: f64,
    pub bound_keyframe_window_secs: f64,
    pub edge_keyframe_window_secs: f64,
    pub keyframe_warning_secs: f64,
    pub bitrate: BitratePolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            bound_keyframe_window_secs: 1.6,
            edge_keyframe_window_secs: 1.0,
            keyframe_warning_secs: KEYFRAME_DISTANCE_WARNING_SECS,
            bitrate: BitratePolicy::default(),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &SnipFixConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self {
            frame_rate: config.frame_rate,
            bound_keyframe_window_secs: config.bound_keyframe_window_secs,
            edge_keyframe_window_secs: config.edge_keyframe_window_secs,
            keyframe_warning_secs: config.keyframe_warning_secs,
            bitrate: config.bitrate_policy()?,
        })
    }
}

/// Per-upload options
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadOptions {
    /// Media duration when known up front; otherwise the engine's probe is used
    pub duration: Option<f64>,
}

/// Explicit session object: timeline, playback and pipeline around injected
/// collaborators
pub struct Session {
    settings: SessionSettings,
    timeline: SharedTimeline,
    transport: Transport,
    pipeline: TranscodePipeline,
    elements: Arc<dyn MediaElementFactory>,
    metadata: Option<MediaMetadata>,
    /// Set once the engine accepted an upload, even if loading failed later
    input_written: bool,
}

impl Session {
    pub fn new(
        engine: Arc<dyn MediaEnginePort>,
        mixer: Arc<dyn AudioMixerPort>,
        elements: Arc<dyn MediaElementFactory>,
        settings: SessionSettings,
    ) -> Self {
        let timeline = Timeline::new(settings.frame_rate)
            .with_keyframe_warning(settings.keyframe_warning_secs)
            .into_shared();
        let pipeline =
            TranscodePipeline::new(engine, mixer, Arc::clone(&elements), timeline.clone())
                .with_bitrate_policy(settings.bitrate);
        Self {
            settings,
            transport: Transport::new(timeline.clone()),
            timeline,
            pipeline,
            elements,
            metadata: None,
            input_written: false,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn timeline(&self) -> &SharedTimeline {
        &self.timeline
    }

    pub fn pipeline(&self) -> &TranscodePipeline {
        &self.pipeline
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn metadata(&self) -> Option<MediaMetadata> {
        self.metadata
    }

    pub fn current_task(&self) -> Task {
        self.pipeline.current_task()
    }

    /// Busy/idle signal of the media engine
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.pipeline.subscribe_busy()
    }

    /// Upload a video: split its audio streams into tracks, load the
    /// silenced video and find the keyframes at both media edges.
    ///
    /// A session takes one upload. Once the engine has accepted the bytes,
    /// later uploads are rejected even when this one failed part way.
    pub async fn load_video(
        &mut self,
        bytes: &[u8],
        options: LoadOptions,
    ) -> Result<LoadReport, DomainError> {
        if self.input_written {
            return Err(DomainError::BadArgs(
                "A video was already uploaded to this session".to_string(),
            ));
        }

        let gate = self.pipeline.gate();
        if gate.is_busy() {
            return Err(DomainError::Busy {
                active: gate.current(),
                requested: Task::Writing,
            });
        }

        self.input_written = true;
        let report = self.pipeline.write_loud_input(bytes, options.duration).await?;
        let duration = options
            .duration
            .or(report.probed_duration)
            .ok_or_else(|| DomainError::NotReady("media duration unknown".to_string()))?;
        let metadata = MediaMetadata::new(duration, self.settings.frame_rate)?;

        let silenced = report
            .silenced_video
            .as_ref()
            .map(|artifact| artifact.bytes.clone())
            .ok_or_else(|| DomainError::MissingResource(SILENCED_INPUT.to_string()))?;
        {
            let mut timeline = self.timeline.lock();
            let element = self.elements.create(TrackRole::Video);
            let source =
                MediaSource::new(SILENCED_INPUT, MIME_MP4, silenced).with_duration(duration);
            timeline.create_loaded_track(VIDEO_TRACK_NAME, TrackRole::Video, element, source);
            timeline.configure(metadata)?;
        }
        self.metadata = Some(metadata);
        info!(
            "Loaded {:.3}s video with {} audio tracks ({} failed)",
            duration,
            report.audio_tracks.len(),
            report.failures.len()
        );

        let edge_window = self.settings.edge_keyframe_window_secs;
        self.pipeline.find_keyframes_around(0.0, edge_window).await?;
        self.pipeline.find_keyframes_around(duration, edge_window).await?;
        Ok(report)
    }

    /// Move the start bound while it is being dragged
    pub fn set_start_bound(&mut self, frame: u64) -> Result<u64, DomainError> {
        self.transport.set_start_bound(frame)
    }

    pub fn set_end_bound(&mut self, frame: u64) -> Result<u64, DomainError> {
        self.transport.set_end_bound(frame)
    }

    /// Bound released: look for keyframes around its new position
    pub async fn release_start_bound(&self) -> Result<Vec<f64>, DomainError> {
        let time = {
            let timeline = self.timeline.lock();
            timeline.time_of_frame(timeline.bounds()?.start())
        };
        self.pipeline
            .find_keyframes_around(time, self.settings.bound_keyframe_window_secs)
            .await
    }

    pub async fn release_end_bound(&self) -> Result<Vec<f64>, DomainError> {
        let time = {
            let timeline = self.timeline.lock();
            timeline.time_of_frame(timeline.bounds()?.end())
        };
        self.pipeline
            .find_keyframes_around(time, self.settings.bound_keyframe_window_secs)
            .await
    }

    pub fn play(&mut self) -> Result<(), DomainError> {
        self.transport.play_all()
    }

    pub fn pause(&mut self) -> Result<(), DomainError> {
        self.transport.pause_all()
    }

    pub fn toggle_playing(&mut self) -> Result<(), DomainError> {
        self.transport.toggle_playing()
    }

    pub fn seek_playhead(&mut self, frame: u64) -> Result<u64, DomainError> {
        self.transport.seek_playhead(frame)
    }

    /// Set the volume slider of a track; returns the applied media volume
    pub fn set_track_volume(&mut self, track: usize, value: f64) -> Result<f64, DomainError> {
        self.timeline.lock().set_track_volume(track, value)
    }

    /// Render the selection between the bounds to its final artifacts.
    ///
    /// On success the session continues on the rendered segment: every track
    /// plays it and the bounds span it.
    pub async fn commit_cut(&mut self) -> Result<CutReport, DomainError> {
        if self.metadata.is_none() {
            return Err(DomainError::NotReady("no video loaded".to_string()));
        }
        if self.transport.is_playing() {
            if let Err(e) = self.transport.pause_all() {
                warn!("Could not pause before cutting: {}", e);
            }
        }
        let cut = self.pipeline.render_segment_between_bounds().await?;
        let duration = cut.segment_end - cut.segment_start;
        self.metadata = Some(MediaMetadata::new(duration, self.settings.frame_rate)?);
        Ok(cut)
    }
}
