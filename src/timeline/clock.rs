//! Periodic playhead synchronization while playing

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::timeline::SharedTimeline;

/// Drives [`Timeline::tick`](crate::timeline::Timeline::tick) once per video
/// frame until playback stops
pub struct TimelineClock;

impl TimelineClock {
    /// Spawn the clock task on the current tokio runtime
    pub fn start(timeline: SharedTimeline, frame_rate: f64) -> ClockHandle {
        let period = Duration::from_secs_f64(1.0 / frame_rate);
        debug!("Starting timeline clock with period {:?}", period);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of an interval completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !timeline.lock().tick() {
                    break;
                }
            }
            debug!("Timeline clock stopped");
        });

        ClockHandle {
            handle: Some(handle),
        }
    }
}

/// Handle to a running clock task; stopping or dropping it cancels the task
#[derive(Debug)]
pub struct ClockHandle {
    handle: Option<JoinHandle<()>>,
}

impl ClockHandle {
    /// True while the task has not finished or been stopped
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::virtual_media::VirtualMediaElement;
    use crate::domain::model::{MediaMetadata, MediaSource, TrackRole, MIME_MP4};
    use crate::timeline::Timeline;

    fn playing_timeline() -> SharedTimeline {
        let mut timeline = Timeline::new(60.0);
        let source = MediaSource::new("clip.mp4", MIME_MP4, vec![0; 4]).with_duration(12.0);
        timeline.create_loaded_track(
            "Video",
            TrackRole::Video,
            Box::new(VirtualMediaElement::new()),
            source,
        );
        timeline
            .configure(MediaMetadata::new(12.0, 60.0).unwrap())
            .unwrap();
        timeline.play().unwrap();
        timeline.into_shared()
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_follows_video_position() {
        let timeline = playing_timeline();
        let _clock = TimelineClock::start(timeline.clone(), 60.0);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let playhead = timeline.lock().bounds().unwrap().playhead();
        assert!((58..=61).contains(&playhead), "playhead was {}", playhead);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_the_task() {
        let timeline = playing_timeline();
        let mut clock = TimelineClock::start(timeline.clone(), 60.0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(clock.is_running());

        clock.stop();
        assert!(!clock.is_running());
        let frozen = timeline.lock().bounds().unwrap().playhead();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(timeline.lock().bounds().unwrap().playhead(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_the_task() {
        let timeline = playing_timeline();
        let clock = TimelineClock::start(timeline.clone(), 60.0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(clock);

        let frozen = timeline.lock().bounds().unwrap().playhead();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(timeline.lock().bounds().unwrap().playhead(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_finishes_when_playback_stops() {
        let timeline = playing_timeline();
        timeline.lock().set_end_bound(30).unwrap();
        let clock = TimelineClock::start(timeline.clone(), 60.0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!timeline.lock().is_playing());
        assert!(!clock.is_running());
    }
}
