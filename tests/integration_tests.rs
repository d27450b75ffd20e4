use std::sync::Arc;
use std::time::Duration;

use snipfix::adapters::{MockAudioMixer, MockMediaEngine, VirtualMediaFactory};
use snipfix::app::session::VIDEO_TRACK_NAME;
use snipfix::*;

/// Test utilities for driving a whole session against the mock engine
mod test_utils {
    use super::*;

    /// Container bytes carrying two named audio streams
    pub const GAME_AND_MIC: &[u8] = b"\x00\x00\x00\x18ftypisom\
        \x00\x00\x00\x10nameGame\
        \x00\x00\x00\x0cnameMic\
        \x00\x00\x00\x08mdat";

    pub fn engine() -> MockMediaEngine {
        MockMediaEngine::new()
            .with_duration(12.0)
            .with_keyframes(vec![0.0, 1.0, 10.0, 11.5])
    }

    pub fn session(
        engine: MockMediaEngine,
    ) -> (Session, Arc<MockMediaEngine>, Arc<MockAudioMixer>) {
        let engine = Arc::new(engine);
        let mixer = Arc::new(MockAudioMixer::new());
        let session = Session::new(
            engine.clone(),
            mixer.clone(),
            Arc::new(VirtualMediaFactory),
            SessionSettings::default(),
        );
        (session, engine, mixer)
    }

    pub fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {} to be close to {}",
            actual,
            expected
        );
    }
}

use test_utils::*;

#[tokio::test]
async fn test_load_cut_end_to_end() {
    let (mut session, engine, mixer) = session(engine());

    let load = session
        .load_video(GAME_AND_MIC, LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(load.stream_names, vec!["Game", "Mic"]);
    assert_eq!(load.audio_tracks.len(), 2);
    assert!(load.failures.is_empty());
    assert_ne!(load.audio_artifacts[0].bytes, load.audio_artifacts[1].bytes);
    assert_eq!(load.probed_duration, Some(12.0));
    assert_eq!(session.metadata().unwrap().total_frames(), 720);

    {
        let timeline = session.timeline().lock();
        let names: Vec<&str> = timeline.tracks().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Game", "Mic", VIDEO_TRACK_NAME]);
        // both media edges were scanned
        assert_eq!(timeline.keyframes().len(), 3);
    }

    assert_eq!(session.set_start_bound(60).unwrap(), 60);
    assert_eq!(session.set_end_bound(600).unwrap(), 600);
    session.release_start_bound().await.unwrap();
    let found = session.release_end_bound().await.unwrap();
    assert_eq!(found.len(), 1);
    assert_close(found[0], 10.0);

    let cut = session.commit_cut().await.unwrap();
    assert_close(cut.segment_start, 1.0);
    assert_close(cut.segment_end, 10.0);
    assert_eq!(cut.trimmed_duration, 9.0);
    assert_eq!(cut.encode_bitrate, 7083713);
    assert_eq!(mixer.calls(), vec![2]);

    let last = engine.runs().last().cloned().unwrap();
    assert_eq!(last[3], "7083713");
    assert_eq!(last[5], "7083713");

    let mut names: Vec<String> = load
        .artifacts()
        .chain(cut.artifacts())
        .map(|artifact| artifact.file_name.clone())
        .collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total);
    assert_eq!(total, 7);

    assert_eq!(session.current_task(), Task::None);
    assert!(!*session.subscribe_busy().borrow());

    // every track now plays the 9 second segment on one time base
    assert_eq!(session.metadata().unwrap().total_frames(), 540);
    assert_eq!(session.seek_playhead(120).unwrap(), 120);
    let timeline = session.timeline().lock();
    assert_eq!(timeline.bounds().unwrap().end(), 539);
    for track in timeline.tracks().iter() {
        assert_eq!(track.element().duration(), Some(9.0));
        assert_close(track.element().current_time(), 2.0);
    }
}

#[tokio::test]
async fn test_recut_after_moving_bounds() {
    let (mut session, _engine, _mixer) = session(engine());
    session
        .load_video(GAME_AND_MIC, LoadOptions::default())
        .await
        .unwrap();

    session.set_end_bound(600).unwrap();
    session.release_end_bound().await.unwrap();
    let first = session.commit_cut().await.unwrap();
    assert_close(first.segment_start, 0.0);
    assert_close(first.segment_end, 10.0);

    // bounds now span the 10 second segment
    assert_eq!(session.timeline().lock().bounds().unwrap().end(), 599);
    session.set_start_bound(60).unwrap();
    let second = session.commit_cut().await.unwrap();
    assert_close(second.segment_start, 1.0);
    assert_close(second.segment_end, 10.0);
    assert!(second.trimmed_duration < first.trimmed_duration);
    assert_eq!(session.metadata().unwrap().total_frames(), 540);
}

#[tokio::test(start_paused = true)]
async fn test_busy_engine_rejects_second_task() {
    let (mut session, engine, _mixer) = session(engine().with_run_delay(Duration::from_millis(50)));
    session
        .load_video(GAME_AND_MIC, LoadOptions::default())
        .await
        .unwrap();
    session.set_start_bound(60).unwrap();
    session.set_end_bound(600).unwrap();
    let before = engine.run_count();

    let (start, end) = tokio::join!(session.release_start_bound(), async {
        tokio::task::yield_now().await;
        session.release_end_bound().await
    });
    assert!(start.is_ok());
    assert!(matches!(
        end,
        Err(DomainError::Busy {
            active: Task::FindingKeyframes,
            requested: Task::FindingKeyframes
        })
    ));
    assert_eq!(engine.run_count(), before + 1);
    assert_eq!(session.current_task(), Task::None);
}

#[tokio::test]
async fn test_cut_without_named_streams() {
    let (mut session, _engine, mixer) = session(engine());
    let load = session
        .load_video(b"\x00\x00\x00\x08mdat", LoadOptions { duration: Some(12.0) })
        .await
        .unwrap();
    assert!(load.audio_tracks.is_empty());

    session.set_end_bound(600).unwrap();
    session.release_end_bound().await.unwrap();
    let cut = session.commit_cut().await.unwrap();
    assert!(cut.merged_audio.is_none());
    assert!(mixer.calls().is_empty());
    assert_eq!(cut.artifacts().count(), 3);
}

#[tokio::test]
async fn test_failed_stream_is_reported() {
    let (mut session, _engine, _mixer) = session(engine().failing_on("0:a:1"));
    let load = session
        .load_video(GAME_AND_MIC, LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(load.audio_tracks.len(), 1);
    assert_eq!(load.failures.len(), 1);
    assert_eq!(load.failures[0].name, "Mic");

    session.set_end_bound(600).unwrap();
    let cut = session.commit_cut().await.unwrap();
    assert!(cut.merged_audio.is_some());
}

#[tokio::test]
async fn test_playback_and_volume() {
    let (mut session, _engine, _mixer) = session(engine());
    session
        .load_video(GAME_AND_MIC, LoadOptions::default())
        .await
        .unwrap();

    session.play().unwrap();
    assert!(session.transport().is_playing());
    session.toggle_playing().unwrap();
    assert!(!session.transport().is_playing());

    assert_eq!(session.seek_playhead(120).unwrap(), 120);
    assert_eq!(session.set_track_volume(1, 50.0).unwrap(), 0.5);
    assert!(session.set_track_volume(9, 50.0).is_err());
}
