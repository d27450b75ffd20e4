//! Multi-track timeline: bounds, playhead, keyframes and playback state
//!
//! The [`Timeline`] is shared between the periodic clock task and the
//! transcode pipeline as a [`SharedTimeline`]. Every method leaves the
//! bounds/playhead invariants intact before returning, so no lock ever
//! needs to be held across an `.await`.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::domain::errors::DomainError;
use crate::domain::model::{MediaMetadata, MediaSource, TrackRole};
use crate::ports::MediaElement;

pub mod bounds;
pub mod clock;
pub mod keyframes;
pub mod tracks;
pub mod transport;

pub use bounds::BoundsController;
pub use clock::{ClockHandle, TimelineClock};
pub use keyframes::KeyframeIndex;
pub use tracks::{Track, TrackSet, TrackState};
pub use transport::Transport;

/// Tolerance added before flooring a time to a frame index
const FRAME_EPSILON: f64 = 1e-6;

/// Timeline shared between the clock task and the pipeline
pub type SharedTimeline = Arc<Mutex<Timeline>>;

/// Playback and selection state of one editing session
#[derive(Debug)]
pub struct Timeline {
    frame_rate: f64,
    duration: Option<f64>,
    bounds: Option<BoundsController>,
    keyframes: KeyframeIndex,
    tracks: TrackSet,
    current_time: f64,
    playing: bool,
    layout_height_rem: f64,
}

impl Timeline {
    /// Create an empty timeline; bounds activate once metadata is known
    pub fn new(frame_rate: f64) -> Self {
        Self {
            frame_rate,
            duration: None,
            bounds: None,
            keyframes: KeyframeIndex::new(),
            tracks: TrackSet::new(),
            current_time: 0.0,
            playing: false,
            layout_height_rem: -1.0,
        }
    }

    pub fn with_keyframe_warning(mut self, seconds: f64) -> Self {
        self.keyframes = KeyframeIndex::new().with_warning_distance(seconds);
        self
    }

    pub fn into_shared(self) -> SharedTimeline {
        Arc::new(Mutex::new(self))
    }

    /// Apply loaded media metadata: bounds span the whole media
    pub fn configure(&mut self, metadata: MediaMetadata) -> Result<(), DomainError> {
        let bounds = BoundsController::new(metadata.total_frames())?;
        info!(
            "Timeline configured: {:.3}s at {} fps, {} frames",
            metadata.duration,
            metadata.frame_rate,
            bounds.total_frames()
        );
        self.frame_rate = metadata.frame_rate;
        self.duration = Some(metadata.duration);
        self.bounds = Some(bounds);
        self.sync_playhead_to_media();
        self.colorize_all_clips();
        Ok(())
    }

    /// Switch the timeline to a rendered segment of `[from, to]`.
    ///
    /// The video track plays `video`, each `(track, source)` pair replaces an
    /// audio source, keyframes move to the segment time base and the bounds
    /// span the whole segment again.
    pub fn adopt_segment(
        &mut self,
        from: f64,
        to: f64,
        video: MediaSource,
        audio: Vec<(usize, MediaSource)>,
    ) -> Result<(), DomainError> {
        let metadata = MediaMetadata::new(to - from, self.frame_rate)?;
        BoundsController::new(metadata.total_frames())?;
        let missing = audio
            .iter()
            .map(|(index, _)| *index)
            .find(|index| self.tracks.get(*index).is_none());
        if let Some(index) = missing {
            return Err(DomainError::BadArgs(format!("No track with index {}", index)));
        }

        self.halt();
        for (index, source) in audio {
            if let Some(track) = self.tracks.get_mut(index) {
                track.load(source);
            }
        }
        let video_index = self.tracks.iter().position(Track::is_video);
        match video_index {
            Some(index) => {
                if let Some(track) = self.tracks.get_mut(index) {
                    track.load(video);
                }
            }
            None => debug!("No video track to load segment {} into", video.name),
        }
        self.keyframes.rebase(from, to);
        self.current_time = 0.0;
        self.tracks.set_current_time(0.0);
        self.configure(metadata)
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn keyframes(&self) -> &KeyframeIndex {
        &self.keyframes
    }

    pub fn keyframes_mut(&mut self) -> &mut KeyframeIndex {
        &mut self.keyframes
    }

    pub fn tracks(&self) -> &TrackSet {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut TrackSet {
        &mut self.tracks
    }

    pub fn layout_height_rem(&self) -> f64 {
        self.layout_height_rem
    }

    pub fn bounds(&self) -> Result<&BoundsController, DomainError> {
        self.bounds
            .as_ref()
            .ok_or_else(|| DomainError::NotReady("media metadata not loaded".to_string()))
    }

    fn bounds_mut(&mut self) -> Result<&mut BoundsController, DomainError> {
        self.bounds
            .as_mut()
            .ok_or_else(|| DomainError::NotReady("media metadata not loaded".to_string()))
    }

    pub fn time_of_frame(&self, frame: u64) -> f64 {
        frame as f64 / self.frame_rate
    }

    pub fn frame_of_time(&self, seconds: f64) -> u64 {
        (seconds * self.frame_rate + FRAME_EPSILON).floor().max(0.0) as u64
    }

    pub fn current_frame_index(&self) -> u64 {
        self.frame_of_time(self.current_time)
    }

    /// Add a track, resize the layout and recolor every track
    pub fn create_track(
        &mut self,
        name: impl Into<String>,
        role: TrackRole,
        mut element: Box<dyn MediaElement>,
    ) -> usize {
        element.set_current_time(self.current_time);
        let index = self.tracks.push(Track::new(name, role, element));
        self.layout_height_rem = self.tracks.layout_height_rem();
        self.colorize_all_clips();
        debug!(
            "Created track {} ({} tracks, layout height {}rem)",
            index,
            self.tracks.len(),
            self.layout_height_rem
        );
        index
    }

    /// Add a track and attach its first source
    pub fn create_loaded_track(
        &mut self,
        name: impl Into<String>,
        role: TrackRole,
        element: Box<dyn MediaElement>,
        source: MediaSource,
    ) -> usize {
        let index = self.create_track(name, role, element);
        let current_time = self.current_time;
        if let Some(track) = self.tracks.get_mut(index) {
            track.load(source);
            track.element_mut().set_current_time(current_time);
        }
        self.colorize_all_clips();
        index
    }

    /// Index of the `n`-th audio track in the track set
    pub fn audio_track_index(&self, n: usize) -> Option<usize> {
        self.tracks
            .iter()
            .enumerate()
            .filter(|(_, track)| !track.is_video())
            .nth(n)
            .map(|(index, _)| index)
    }

    pub fn set_track_volume(&mut self, index: usize, value: f64) -> Result<f64, DomainError> {
        self.tracks
            .get_mut(index)
            .ok_or_else(|| DomainError::BadArgs(format!("No track with index {}", index)))?
            .set_volume_percent(value)
    }

    /// Seek every track and move the playhead to match
    pub fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds;
        self.tracks.set_current_time(seconds);
        self.sync_playhead_to_media();
    }

    pub fn set_current_frame(&mut self, frame: u64) {
        self.set_current_time(self.time_of_frame(frame));
    }

    /// Playhead follows the media position
    pub fn sync_playhead_to_media(&mut self) {
        let frame = self.current_frame_index();
        if let Some(bounds) = self.bounds.as_mut() {
            bounds.set_playhead(frame);
        }
    }

    /// Media follows the playhead
    pub fn sync_media_to_playhead(&mut self) {
        if let Some(playhead) = self.bounds.as_ref().map(BoundsController::playhead) {
            self.set_current_frame(playhead);
        }
    }

    pub fn play(&mut self) -> Result<(), DomainError> {
        self.tracks.play_all(self.current_time)?;
        self.playing = true;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), DomainError> {
        self.tracks.pause_all()?;
        self.playing = false;
        Ok(())
    }

    fn halt(&mut self) {
        if !self.tracks.is_empty() {
            let _ = self.tracks.pause_all();
        }
        self.playing = false;
    }

    /// Rewind to the start bound when playback would resume at the end
    pub fn rewind_if_finished(&mut self) -> Result<(), DomainError> {
        let (start, end) = {
            let bounds = self.bounds()?;
            (bounds.start(), bounds.end())
        };
        let ended = self
            .tracks
            .video()
            .map(|track| track.element().is_ended())
            .unwrap_or(false);
        if ended || self.current_frame_index() == end {
            debug!("Rewinding playhead to start bound {}", start);
            self.set_current_frame(start);
        }
        Ok(())
    }

    pub fn set_start_bound(&mut self, frame: u64) -> Result<u64, DomainError> {
        let start = self.bounds_mut()?.set_start(frame);
        self.keep_media_within_bounds();
        Ok(start)
    }

    pub fn set_end_bound(&mut self, frame: u64) -> Result<u64, DomainError> {
        let end = self.bounds_mut()?.set_end(frame);
        self.keep_media_within_bounds();
        Ok(end)
    }

    /// Scrub the playhead: pauses playback and seeks the media to it
    pub fn seek_playhead(&mut self, frame: u64) -> Result<u64, DomainError> {
        self.bounds()?;
        self.halt();
        let playhead = self.bounds_mut()?.set_playhead(frame);
        self.sync_media_to_playhead();
        self.keep_media_within_bounds();
        Ok(playhead)
    }

    /// Stop at the end bound while playing and pull the media back inside
    /// the bounds after any other move
    pub fn keep_media_within_bounds(&mut self) {
        let Some(bounds) = self.bounds.as_ref() else {
            return;
        };
        let (start, end) = (bounds.start(), bounds.end());
        let clip_start_time = self.time_of_frame(start);
        let clip_end_time = self.time_of_frame(end);

        if self.playing && self.current_time >= clip_end_time - 1.0 / self.frame_rate {
            self.halt();
            self.set_current_time(clip_end_time);
        }

        if self.current_time > clip_end_time {
            self.set_current_frame(end);
        }
        if self.current_time < clip_start_time {
            self.set_current_frame(start);
        }
        self.sync_playhead_to_media();
        self.colorize_all_clips();
    }

    /// One clock step. Returns whether playback is still running.
    pub fn tick(&mut self) -> bool {
        let Some(video) = self.tracks.video() else {
            self.playing = false;
            return false;
        };
        let position = video.element().current_time();
        let ended = video.element().is_ended();

        self.current_time = position;
        self.sync_playhead_to_media();
        self.keep_media_within_bounds();

        if ended && self.playing {
            debug!("Video reached end of media at {:.3}s", position);
            self.halt();
        }
        self.playing
    }

    pub fn colorize_all_clips(&mut self) {
        if let Some(bounds) = self.bounds.as_ref() {
            let start_time = bounds.start_time(self.frame_rate);
            let end_time = bounds.end_time(self.frame_rate);
            self.tracks.colorize_all(start_time, end_time);
        }
    }

    pub fn closest_keyframe_to_start(&self) -> Result<f64, DomainError> {
        let time = self.time_of_frame(self.bounds()?.start());
        self.keyframes.nearest(time).ok_or(DomainError::NoKeyframes)
    }

    pub fn closest_keyframe_to_end(&self) -> Result<f64, DomainError> {
        let time = self.time_of_frame(self.bounds()?.end());
        self.keyframes.nearest(time).ok_or(DomainError::NoKeyframes)
    }
}
