//! Play/pause/seek controls owning the timeline clock

use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::timeline::{ClockHandle, SharedTimeline, TimelineClock};

/// User-facing playback controls. Holds at most one live clock task.
///
/// Starting playback spawns onto the ambient tokio runtime.
pub struct Transport {
    timeline: SharedTimeline,
    clock: Option<ClockHandle>,
    clock_starts: usize,
}

impl Transport {
    pub fn new(timeline: SharedTimeline) -> Self {
        Self {
            timeline,
            clock: None,
            clock_starts: 0,
        }
    }

    pub fn timeline(&self) -> &SharedTimeline {
        &self.timeline
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock.as_ref().map(ClockHandle::is_running).unwrap_or(false)
    }

    /// How many clock tasks have been spawned over the transport's life
    pub fn clock_starts(&self) -> usize {
        self.clock_starts
    }

    pub fn is_playing(&self) -> bool {
        self.timeline.lock().is_playing()
    }

    pub fn play_all(&mut self) -> Result<(), DomainError> {
        let frame_rate = {
            let mut timeline = self.timeline.lock();
            if timeline.is_playing() && self.is_clock_running() {
                debug!("Already playing, clock left running");
                return Ok(());
            }
            timeline.play()?;
            timeline.frame_rate()
        };

        if let Some(mut clock) = self.clock.take() {
            clock.stop();
        }
        self.clock = Some(TimelineClock::start(self.timeline.clone(), frame_rate));
        self.clock_starts += 1;
        Ok(())
    }

    pub fn pause_all(&mut self) -> Result<(), DomainError> {
        if let Some(mut clock) = self.clock.take() {
            clock.stop();
        }
        self.timeline.lock().pause()
    }

    /// Play from the start bound when finished, otherwise flip play/pause
    pub fn toggle_playing(&mut self) -> Result<(), DomainError> {
        let playing = {
            let mut timeline = self.timeline.lock();
            if timeline.tracks().is_empty() {
                warn!("Cannot play media if there are no tracks!");
                return Err(DomainError::NoTracks);
            }
            match timeline.rewind_if_finished() {
                Ok(()) | Err(DomainError::NotReady(_)) => {}
                Err(e) => return Err(e),
            }
            timeline.is_playing()
        };

        if playing {
            self.pause_all()
        } else {
            self.play_all()
        }
    }

    /// Scrub to a frame; playback pauses first
    pub fn seek_playhead(&mut self, frame: u64) -> Result<u64, DomainError> {
        if let Some(mut clock) = self.clock.take() {
            clock.stop();
        }
        self.timeline.lock().seek_playhead(frame)
    }

    pub fn set_start_bound(&mut self, frame: u64) -> Result<u64, DomainError> {
        self.timeline.lock().set_start_bound(frame)
    }

    pub fn set_end_bound(&mut self, frame: u64) -> Result<u64, DomainError> {
        self.timeline.lock().set_end_bound(frame)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::adapters::virtual_media::VirtualMediaElement;
    use crate::domain::model::{MediaMetadata, MediaSource, TrackRole, MIME_AAC, MIME_MP4};
    use crate::timeline::Timeline;

    fn source(name: &str, mime: &str, duration: f64) -> MediaSource {
        MediaSource::new(name, mime, vec![0; 8]).with_duration(duration)
    }

    fn transport() -> Transport {
        let mut timeline = Timeline::new(60.0);
        timeline.create_loaded_track(
            "Video",
            TrackRole::Video,
            Box::new(VirtualMediaElement::new()),
            source("video.mp4", MIME_MP4, 12.0),
        );
        timeline.create_loaded_track(
            "Voice",
            TrackRole::Audio,
            Box::new(VirtualMediaElement::new()),
            source("voice.aac", MIME_AAC, 12.0),
        );
        timeline
            .configure(MediaMetadata::new(12.0, 60.0).unwrap())
            .unwrap();
        Transport::new(timeline.into_shared())
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_all_twice_spawns_one_clock() {
        let mut transport = transport();
        transport.play_all().unwrap();
        transport.play_all().unwrap();
        assert_eq!(transport.clock_starts(), 1);
        assert!(transport.is_clock_running());
        transport.pause_all().unwrap();
        assert!(!transport.is_clock_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_stops_at_end_bound() {
        let mut transport = transport();
        transport.set_end_bound(60).unwrap();
        transport.play_all().unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;

        let timeline = transport.timeline().lock();
        assert!(!timeline.is_playing());
        assert_eq!(timeline.current_time(), 1.0);
        assert_eq!(timeline.bounds().unwrap().playhead(), 60);
        drop(timeline);
        // give the clock task a tick to observe the pause
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!transport.is_clock_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_playhead() {
        let mut transport = transport();
        transport.play_all().unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        transport.pause_all().unwrap();

        let playhead = transport.timeline().lock().bounds().unwrap().playhead();
        assert!((28..=31).contains(&playhead), "playhead was {}", playhead);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_rewinds_after_reaching_end_bound() {
        let mut transport = transport();
        transport.set_start_bound(30).unwrap();
        transport.set_end_bound(90).unwrap();
        transport.play_all().unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!transport.is_playing());
        assert_eq!(transport.timeline().lock().current_frame_index(), 90);

        transport.toggle_playing().unwrap();
        assert!(transport.is_playing());
        let frame = transport.timeline().lock().current_frame_index();
        assert_eq!(frame, 30);
        transport.pause_all().unwrap();
    }

    #[tokio::test]
    async fn test_toggle_without_tracks() {
        let mut transport = Transport::new(Timeline::new(60.0).into_shared());
        assert_eq!(transport.toggle_playing(), Err(DomainError::NoTracks));
        assert_eq!(transport.play_all(), Err(DomainError::NoTracks));
        assert_eq!(transport.clock_starts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_stops_clock() {
        let mut transport = transport();
        transport.play_all().unwrap();
        assert_eq!(transport.seek_playhead(240).unwrap(), 240);
        assert!(!transport.is_clock_running());
        assert!(!transport.is_playing());
    }
}
