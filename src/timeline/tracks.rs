//! Media tracks and the synchronized track set

use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{HighlightRegion, MediaSource, TrackRole};
use crate::domain::rules::slider_to_volume;
use crate::ports::MediaElement;

/// Lifecycle of a track's media binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Created without a media source
    Unbound,
    /// Source attached
    Bound,
    /// Has taken part in an aggregate play, pause or seek
    Active,
}

/// One row of the timeline: a named media element plus its highlight
pub struct Track {
    name: String,
    role: TrackRole,
    element: Box<dyn MediaElement>,
    state: TrackState,
    volume_percent: f64,
    highlight: Option<HighlightRegion>,
}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("state", &self.state)
            .field("volume_percent", &self.volume_percent)
            .field("highlight", &self.highlight)
            .finish()
    }
}

impl Track {
    pub fn new(name: impl Into<String>, role: TrackRole, element: Box<dyn MediaElement>) -> Self {
        Self {
            name: name.into(),
            role,
            element,
            state: TrackState::Unbound,
            volume_percent: 100.0,
            highlight: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> TrackRole {
        self.role
    }

    pub fn is_video(&self) -> bool {
        self.role == TrackRole::Video
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn volume_percent(&self) -> f64 {
        self.volume_percent
    }

    pub fn highlight(&self) -> Option<HighlightRegion> {
        self.highlight
    }

    pub fn element(&self) -> &dyn MediaElement {
        self.element.as_ref()
    }

    pub fn element_mut(&mut self) -> &mut dyn MediaElement {
        self.element.as_mut()
    }

    /// Attach a media source; a bound track never becomes unbound again
    pub fn load(&mut self, source: MediaSource) {
        debug!("Loading source {} into track {}", source.name, self.name);
        self.element.load(source);
        if self.state == TrackState::Unbound {
            self.state = TrackState::Bound;
        }
    }

    /// Apply a volume slider value; video tracks carry no volume control
    pub fn set_volume_percent(&mut self, value: f64) -> Result<f64, DomainError> {
        if self.is_video() {
            return Err(DomainError::BadArgs(format!(
                "Track {} is a video track and has no volume control",
                self.name
            )));
        }
        let volume = slider_to_volume(value);
        self.volume_percent = value.clamp(0.0, 100.0);
        self.element.set_volume(volume);
        Ok(volume)
    }

    /// Recompute the highlighted region from the bound times
    pub fn colorize(&mut self, start_time: f64, end_time: f64) {
        self.highlight = self
            .element
            .duration()
            .and_then(|duration| HighlightRegion::compute(start_time, end_time, duration));
    }

    fn activate(&mut self) -> bool {
        match self.state {
            TrackState::Unbound => false,
            TrackState::Bound | TrackState::Active => {
                self.state = TrackState::Active;
                true
            }
        }
    }
}

/// All tracks of a session; aggregate operations apply to every bound track
#[derive(Debug, Default)]
pub struct TrackSet {
    tracks: Vec<Track>,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Register a track and return its index
    pub fn push(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// The first video track, which drives the timeline clock
    pub fn video(&self) -> Option<&Track> {
        self.tracks.iter().find(|track| track.is_video())
    }

    pub fn audio(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|track| !track.is_video())
    }

    /// Height of the bound sliders, in rem, spanning every track row
    pub fn layout_height_rem(&self) -> f64 {
        5.0 * self.tracks.len() as f64 - 1.0
    }

    pub fn play_all(&mut self, from: f64) -> Result<(), DomainError> {
        if self.tracks.is_empty() {
            warn!("Cannot play media if there are no tracks!");
            return Err(DomainError::NoTracks);
        }
        for track in self.tracks.iter_mut() {
            if track.activate() {
                track.element.set_current_time(from);
                track.element.play();
            }
        }
        Ok(())
    }

    pub fn pause_all(&mut self) -> Result<(), DomainError> {
        if self.tracks.is_empty() {
            warn!("Cannot pause media if there are no tracks!");
            return Err(DomainError::NoTracks);
        }
        for track in self.tracks.iter_mut() {
            if track.activate() {
                track.element.pause();
            }
        }
        Ok(())
    }

    /// Seek every track; syncing the playhead is the caller's job
    pub fn set_current_time(&mut self, seconds: f64) {
        for track in self.tracks.iter_mut() {
            if track.activate() {
                track.element.set_current_time(seconds);
            }
        }
    }

    pub fn colorize_all(&mut self, start_time: f64, end_time: f64) {
        for track in &mut self.tracks {
            track.colorize(start_time, end_time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::virtual_media::VirtualMediaElement;
    use crate::domain::model::{MIME_AAC, MIME_MP4};

    fn track(name: &str, role: TrackRole) -> Track {
        Track::new(name, role, Box::new(VirtualMediaElement::new()))
    }

    fn source(name: &str, mime: &str) -> MediaSource {
        MediaSource::new(name, mime, vec![0; 4]).with_duration(8.0)
    }

    #[test]
    fn test_track_lifecycle() {
        let mut voice = track("Voice", TrackRole::Audio);
        assert_eq!(voice.state(), TrackState::Unbound);
        assert!(!voice.activate());
        assert_eq!(voice.state(), TrackState::Unbound);

        voice.load(source("voice.aac", MIME_AAC));
        assert_eq!(voice.state(), TrackState::Bound);
        assert!(voice.activate());
        assert_eq!(voice.state(), TrackState::Active);

        // a new source keeps the track active
        voice.load(source("segment.aac", MIME_AAC));
        assert_eq!(voice.state(), TrackState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aggregate_ops_skip_unbound_tracks() {
        let mut tracks = TrackSet::new();
        let mut video = track("Video", TrackRole::Video);
        video.load(source("video.mp4", MIME_MP4));
        tracks.push(video);
        tracks.push(track("Pending", TrackRole::Audio));

        tracks.set_current_time(3.0);
        assert_eq!(tracks.get(0).unwrap().element().current_time(), 3.0);
        assert_eq!(tracks.get(1).unwrap().element().current_time(), 0.0);

        tracks.play_all(2.0).unwrap();
        assert_eq!(tracks.get(0).unwrap().state(), TrackState::Active);
        assert_eq!(tracks.get(1).unwrap().state(), TrackState::Unbound);

        tracks.pause_all().unwrap();
        assert_eq!(tracks.get(0).unwrap().element().current_time(), 2.0);
        assert_eq!(tracks.get(1).unwrap().state(), TrackState::Unbound);
    }

    #[test]
    fn test_empty_set_rejects_play_and_pause() {
        let mut tracks = TrackSet::new();
        assert_eq!(tracks.play_all(0.0), Err(DomainError::NoTracks));
        assert_eq!(tracks.pause_all(), Err(DomainError::NoTracks));
        assert_eq!(tracks.layout_height_rem(), -1.0);
    }

    #[test]
    fn test_audio_and_video_lookup() {
        let mut tracks = TrackSet::new();
        tracks.push(track("Game", TrackRole::Audio));
        tracks.push(track("Video", TrackRole::Video));
        tracks.push(track("Mic", TrackRole::Audio));

        assert_eq!(tracks.video().unwrap().name(), "Video");
        let audio: Vec<&str> = tracks.audio().map(Track::name).collect();
        assert_eq!(audio, vec!["Game", "Mic"]);
        assert_eq!(tracks.layout_height_rem(), 14.0);
    }

    #[test]
    fn test_highlight_needs_known_duration() {
        let mut voice = track("Voice", TrackRole::Audio);
        voice.colorize(1.0, 3.0);
        assert!(voice.highlight().is_none());

        voice.load(source("voice.aac", MIME_AAC));
        voice.colorize(2.0, 6.0);
        let region = voice.highlight().unwrap();
        assert_eq!(region.start_percent, 25.0);
        assert_eq!(region.width_percent, 50.0);
    }

    #[test]
    fn test_volume_slider_mapping() {
        let mut voice = track("Voice", TrackRole::Audio);
        assert_eq!(voice.set_volume_percent(150.0).unwrap(), 1.0);
        assert_eq!(voice.volume_percent(), 100.0);
        assert_eq!(voice.set_volume_percent(30.0).unwrap(), 0.3);

        let mut video = track("Video", TrackRole::Video);
        assert!(matches!(video.set_volume_percent(30.0), Err(DomainError::BadArgs(_))));
    }
}
