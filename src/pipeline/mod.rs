//! Transcode pipeline: ordered, busy-gated media engine operations
//!
//! Each public operation enters exactly one [`Task`] through the
//! [`TaskGate`] before touching the engine. A rejected operation issues no
//! engine call. Results flow back into the shared timeline (audio track
//! sources, keyframes) and out to the caller as [`Artifact`]s.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{
    Artifact, ArtifactSummary, EngineLog, LogChannel, MediaMetadata, MediaSource, Task, TrackRole,
    MIME_AAC, MIME_MP4, MIME_WAV,
};
use crate::domain::rules::{trimmed_duration, BitratePolicy, KeyframeSearchPlanner};
use crate::ports::{AudioMixerPort, MediaElementFactory, MediaEnginePort};
use crate::probe::stream_names::extract_audio_stream_names;
use crate::timeline::SharedTimeline;

pub mod files;
pub mod showinfo;
pub mod task;

pub use files::FileNamespace;
pub use task::{TaskGate, TaskGuard};

use files::{
    LOUD_INPUT, SEGMENT_LOUD, SEGMENT_LOUD_COMPRESSED, SEGMENT_MERGED_AAC, SEGMENT_MERGED_WAV,
    SEGMENT_SILENT, SILENCED_INPUT,
};

/// What one engine run reported through its log lines
#[derive(Debug, Default)]
struct RunOutcome {
    keyframe_offsets: Vec<f64>,
    probed_duration: Option<f64>,
}

/// One audio stream that could not be extracted
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFailure {
    pub index: usize,
    pub name: String,
    pub error: DomainError,
}

/// Result of loading the loud input
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub stream_names: Vec<String>,
    /// Track index of each successfully extracted stream, in stream order
    pub audio_tracks: Vec<usize>,
    pub audio_artifacts: Vec<Artifact>,
    pub silenced_video: Option<Artifact>,
    pub failures: Vec<StreamFailure>,
    pub probed_duration: Option<f64>,
}

impl LoadReport {
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.audio_artifacts.iter().chain(self.silenced_video.iter())
    }
}

/// Result of committing a cut
#[derive(Debug, Clone)]
pub struct CutReport {
    pub start_frame: u64,
    pub end_frame: u64,
    pub segment_start: f64,
    pub segment_end: f64,
    pub trimmed_duration: f64,
    pub encode_bitrate: u64,
    pub silent_segment: Artifact,
    pub merged_audio: Option<Artifact>,
    pub loud_video: Artifact,
    pub compressed_video: Artifact,
}

impl CutReport {
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        std::iter::once(&self.silent_segment)
            .chain(self.merged_audio.iter())
            .chain(std::iter::once(&self.loud_video))
            .chain(std::iter::once(&self.compressed_video))
    }

    pub fn summary(&self) -> CutSummary {
        CutSummary {
            start_frame: self.start_frame,
            end_frame: self.end_frame,
            segment_start: self.segment_start,
            segment_end: self.segment_end,
            trimmed_duration: self.trimmed_duration,
            encode_bitrate: self.encode_bitrate,
            artifacts: self.artifacts().map(Artifact::summary).collect(),
        }
    }
}

/// Serializable form of a [`CutReport`]
#[derive(Debug, Clone, Serialize)]
pub struct CutSummary {
    pub start_frame: u64,
    pub end_frame: u64,
    pub segment_start: f64,
    pub segment_end: f64,
    pub trimmed_duration: f64,
    pub encode_bitrate: u64,
    pub artifacts: Vec<ArtifactSummary>,
}

/// Orchestrates every media engine operation of one session
pub struct TranscodePipeline {
    engine: Arc<dyn MediaEnginePort>,
    mixer: Arc<dyn AudioMixerPort>,
    elements: Arc<dyn MediaElementFactory>,
    timeline: SharedTimeline,
    gate: Arc<TaskGate>,
    files: Mutex<FileNamespace>,
    bitrate: BitratePolicy,
}

impl TranscodePipeline {
    pub fn new(
        engine: Arc<dyn MediaEnginePort>,
        mixer: Arc<dyn AudioMixerPort>,
        elements: Arc<dyn MediaElementFactory>,
        timeline: SharedTimeline,
    ) -> Self {
        Self {
            engine,
            mixer,
            elements,
            timeline,
            gate: TaskGate::new(),
            files: Mutex::new(FileNamespace::new()),
            bitrate: BitratePolicy::default(),
        }
    }

    pub fn with_bitrate_policy(mut self, bitrate: BitratePolicy) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn gate(&self) -> &Arc<TaskGate> {
        &self.gate
    }

    pub fn current_task(&self) -> Task {
        self.gate.current()
    }

    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.gate.subscribe()
    }

    pub fn files(&self) -> FileNamespace {
        self.files.lock().clone()
    }

    pub fn timeline(&self) -> &SharedTimeline {
        &self.timeline
    }

    /// Run one command under an already entered task and collect its logs
    async fn execute(
        &self,
        guard: &TaskGuard,
        args: Vec<String>,
    ) -> Result<RunOutcome, DomainError> {
        debug!("[{}] ffmpeg {}", guard.task(), args.join(" "));
        let (sink, mut logs) = mpsc::unbounded_channel();
        let result = self.engine.run(&args, sink).await;

        let mut outcome = RunOutcome::default();
        while let Ok(log) = logs.try_recv() {
            self.handle_engine_log(guard.task(), &log, &mut outcome);
        }
        result?;
        Ok(outcome)
    }

    fn handle_engine_log(&self, task: Task, log: &EngineLog, outcome: &mut RunOutcome) {
        if task == Task::FindingKeyframes && showinfo::is_keyframe_line(log) {
            outcome
                .keyframe_offsets
                .extend(showinfo::parse_pts_times(&log.text));
            return;
        }
        if showinfo::is_end_sentinel(log) {
            if self.gate.release(task) {
                debug!("Media engine is no longer busy");
            }
            return;
        }
        if log.channel == LogChannel::Err {
            if let Some(duration) = showinfo::parse_duration(&log.text) {
                outcome.probed_duration.get_or_insert(duration);
            }
        }
        trace!("[{:?}] {}", log.channel, log.text);
    }

    /// Read a file the engine produced. Unknown names are rejected
    /// without touching the engine.
    pub async fn read_media_file(&self, name: &str) -> Result<Vec<u8>, DomainError> {
        if !self.files.lock().contains(name) {
            error!("Trying to read file that doesn't exist: {}", name);
            return Err(DomainError::MissingResource(name.to_string()));
        }
        self.engine.read_file(name).await
    }

    /// Store the uploaded video in the engine namespace
    pub async fn write_input(&self, bytes: &[u8]) -> Result<(), DomainError> {
        let _guard = self.gate.begin(Task::Writing)?;
        info!("Writing loud input ({} bytes)", bytes.len());
        self.engine.write_file(LOUD_INPUT, bytes).await
    }

    /// Write the input, extract every named audio stream into its own
    /// track, then strip the audio from the video.
    ///
    /// Extraction failures of single streams are collected in the report.
    pub async fn write_loud_input(
        &self,
        bytes: &[u8],
        duration_hint: Option<f64>,
    ) -> Result<LoadReport, DomainError> {
        self.write_input(bytes).await?;

        let stream_names = extract_audio_stream_names(bytes);
        info!("Found {} named audio streams: {:?}", stream_names.len(), stream_names);

        let mut report = LoadReport {
            stream_names: stream_names.clone(),
            ..LoadReport::default()
        };

        for (index, name) in stream_names.iter().enumerate() {
            match self.extract_audio_stream(index, name, duration_hint).await {
                Ok((track, artifact, probed)) => {
                    report.audio_tracks.push(track);
                    report.audio_artifacts.push(artifact);
                    if report.probed_duration.is_none() {
                        report.probed_duration = probed;
                    }
                }
                Err(error) => {
                    warn!("Failed to extract audio stream {} ({}): {}", index, name, error);
                    report.failures.push(StreamFailure {
                        index,
                        name: name.clone(),
                        error,
                    });
                }
            }
        }

        let (artifact, probed) = self.remove_audio_from_video().await?;
        report.silenced_video = Some(artifact);
        if report.probed_duration.is_none() {
            report.probed_duration = probed;
        }
        Ok(report)
    }

    /// Extract audio stream `index` with loudness normalization and attach
    /// it to a new audio track
    pub async fn extract_audio_stream(
        &self,
        index: usize,
        name: &str,
        duration_hint: Option<f64>,
    ) -> Result<(usize, Artifact, Option<f64>), DomainError> {
        let guard = self.gate.begin(Task::Extracting)?;
        let output = format!("loudInputAudio{}.aac", index);
        let args = vec![
            "-i".to_string(),
            LOUD_INPUT.to_string(),
            "-filter:a".to_string(),
            "loudnorm".to_string(),
            "-map".to_string(),
            format!("0:a:{}", index),
            output.clone(),
        ];
        let outcome = self.execute(&guard, args).await?;
        drop(guard);

        self.files.lock().add_loud_input_audio(index);
        let bytes = self.read_media_file(&output).await?;

        let mut source = MediaSource::new(output, MIME_AAC, bytes.clone());
        if let Some(duration) = duration_hint.or(outcome.probed_duration) {
            source = source.with_duration(duration);
        }
        let element = self.elements.create(TrackRole::Audio);
        let track = self
            .timeline
            .lock()
            .create_loaded_track(name, TrackRole::Audio, element, source);
        info!("Extracted audio stream {} into track {} ({})", index, track, name);

        let artifact = Artifact::new(
            format!("audio{}.aac", index),
            MIME_AAC,
            format!("Audio {}", name),
            bytes,
        );
        Ok((track, artifact, outcome.probed_duration))
    }

    /// Copy the video stream without any audio
    pub async fn remove_audio_from_video(&self) -> Result<(Artifact, Option<f64>), DomainError> {
        let guard = self.gate.begin(Task::Removing)?;
        let args = vec![
            "-i".to_string(),
            LOUD_INPUT.to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-an".to_string(),
            SILENCED_INPUT.to_string(),
        ];
        let outcome = self.execute(&guard, args).await?;
        drop(guard);

        let bytes = self.read_media_file(SILENCED_INPUT).await?;
        Ok((
            Artifact::new("video-silenced.mp4", MIME_MP4, "Silenced video", bytes),
            outcome.probed_duration,
        ))
    }

    /// Scan a window around `target` for keyframes and add them to the
    /// timeline's index. Returns the newly discovered timestamps.
    pub async fn find_keyframes_around(
        &self,
        target: f64,
        window: f64,
    ) -> Result<Vec<f64>, DomainError> {
        let guard = self.gate.begin(Task::FindingKeyframes)?;
        let duration = self
            .timeline
            .lock()
            .duration()
            .ok_or_else(|| DomainError::NotReady("media duration unknown".to_string()))?;

        let search = KeyframeSearchPlanner::window(target, window, duration);
        debug!(
            "Searching keyframes around {:.3}s in [{:.3}, {:.3}]",
            target,
            search.start,
            search.start + search.length
        );
        let args = vec![
            "-ss".to_string(),
            search.start.to_string(),
            "-i".to_string(),
            LOUD_INPUT.to_string(),
            "-t".to_string(),
            search.length.to_string(),
            "-vf".to_string(),
            "select='eq(pict_type,I)',showinfo".to_string(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        let outcome = self.execute(&guard, args).await?;
        drop(guard);

        let mut timeline = self.timeline.lock();
        let found: Vec<f64> = outcome
            .keyframe_offsets
            .iter()
            .map(|offset| search.start + offset)
            .filter(|&time| timeline.keyframes_mut().add(time))
            .collect();
        info!(
            "Found {} new keyframes near {:.3}s ({} known)",
            found.len(),
            target,
            timeline.keyframes().len()
        );
        Ok(found)
    }

    /// Stream-copy `[from, to]` of `input` into `output`
    pub async fn render_segment(
        &self,
        input: &str,
        from: f64,
        to: f64,
        output: &str,
    ) -> Result<(), DomainError> {
        let guard = self.gate.begin(Task::Rendering)?;
        let args = vec![
            "-i".to_string(),
            input.to_string(),
            "-ss".to_string(),
            from.to_string(),
            "-to".to_string(),
            to.to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string(),
        ];
        self.execute(&guard, args).await?;
        Ok(())
    }

    /// Mix every segment audio stream and re-encode the mix as AAC
    pub async fn create_merged_audio_file(&self) -> Result<Option<Artifact>, DomainError> {
        let segment_streams = self.files.lock().segment_audio_streams().to_vec();
        if segment_streams.is_empty() {
            debug!("No segment audio to merge");
            return Ok(None);
        }

        let guard = self.gate.begin(Task::Merging)?;
        let mut inputs = Vec::with_capacity(segment_streams.len());
        for name in &segment_streams {
            inputs.push(self.read_media_file(name).await?);
        }
        let mixed = self.mixer.mix(inputs).await?;
        debug!(
            "Mixed {} streams into {} bytes of {}",
            segment_streams.len(),
            mixed.len(),
            MIME_WAV
        );

        self.engine.write_file(SEGMENT_MERGED_WAV, &mixed).await?;
        let args = vec![
            "-i".to_string(),
            SEGMENT_MERGED_WAV.to_string(),
            SEGMENT_MERGED_AAC.to_string(),
        ];
        self.execute(&guard, args).await?;
        drop(guard);

        let bytes = self.read_media_file(SEGMENT_MERGED_AAC).await?;
        Ok(Some(Artifact::new("mergedAudio.aac", MIME_AAC, "Merged audio", bytes)))
    }

    /// Remux the silent segment with the given audio files, one stream each
    pub async fn add_audio_streams_to_segment(
        &self,
        audio_files: &[String],
    ) -> Result<Artifact, DomainError> {
        let guard = self.gate.begin(Task::AddingAudio)?;
        let mut args = vec!["-i".to_string(), SEGMENT_SILENT.to_string()];
        for file in audio_files {
            args.push("-i".to_string());
            args.push(file.clone());
        }
        for k in 1..=audio_files.len() {
            args.push("-map".to_string());
            args.push(format!("{}:a:0", k));
        }
        args.extend([
            "-map".to_string(),
            "0:v:0".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            SEGMENT_LOUD.to_string(),
        ]);
        self.execute(&guard, args).await?;
        drop(guard);

        let bytes = self.read_media_file(SEGMENT_LOUD).await?;
        Ok(Artifact::new("trimmed-video-loud.mp4", MIME_MP4, "Trimmed video", bytes))
    }

    /// Re-encode the loud segment at the budget bitrate for its length
    pub async fn compress_segment(
        &self,
        trimmed_seconds: f64,
    ) -> Result<(Artifact, u64), DomainError> {
        let rate = self.bitrate.encode_bitrate(trimmed_seconds)?;
        let guard = self.gate.begin(Task::Rendering)?;
        info!("Compressing {:.3}s segment at {} bit/s", trimmed_seconds, rate);
        let args = vec![
            "-i".to_string(),
            SEGMENT_LOUD.to_string(),
            "-b:v".to_string(),
            rate.to_string(),
            "-maxrate".to_string(),
            rate.to_string(),
            SEGMENT_LOUD_COMPRESSED.to_string(),
        ];
        self.execute(&guard, args).await?;
        drop(guard);

        let bytes = self.read_media_file(SEGMENT_LOUD_COMPRESSED).await?;
        Ok((
            Artifact::new(
                "Trimmed-video-compressed.mp4",
                MIME_MP4,
                "Trimmed video (compressed)",
                bytes,
            ),
            rate,
        ))
    }

    /// Replace the working inputs with the rendered segment so the next cut
    /// operates on what the timeline shows
    async fn promote_segment(
        &self,
        silent: &[u8],
        loud: &[u8],
        loud_streams: &[String],
        segment_audio: &[(String, Vec<u8>)],
    ) -> Result<(), DomainError> {
        let _guard = self.gate.begin(Task::Writing)?;
        self.engine.write_file(SILENCED_INPUT, silent).await?;
        self.engine.write_file(LOUD_INPUT, loud).await?;
        for (loud_stream, (_, bytes)) in loud_streams.iter().zip(segment_audio) {
            self.engine.write_file(loud_stream, bytes).await?;
        }
        debug!("Promoted segment to working inputs ({} audio streams)", segment_audio.len());
        Ok(())
    }

    /// Cut the media between the keyframes closest to the bounds and run
    /// every remaining stage through to the compressed video.
    pub async fn render_segment_between_bounds(&self) -> Result<CutReport, DomainError> {
        if self.gate.is_busy() {
            let active = self.gate.current();
            warn!("Cannot start {} when busy with {}", Task::Rendering, active);
            return Err(DomainError::Busy {
                active,
                requested: Task::Rendering,
            });
        }

        let (from, to, start_frame, end_frame, frame_rate) = {
            let timeline = self.timeline.lock();
            let bounds = timeline.bounds()?;
            (
                timeline.closest_keyframe_to_start()?,
                timeline.closest_keyframe_to_end()?,
                bounds.start(),
                bounds.end(),
                timeline.frame_rate(),
            )
        };
        if !(to > from) {
            return Err(DomainError::BadArgs(format!(
                "Keyframes around the bounds give an empty segment [{}, {}]",
                from, to
            )));
        }
        let segment_metadata = MediaMetadata::new(to - from, frame_rate)?;
        if segment_metadata.total_frames() < 2 {
            return Err(DomainError::BadArgs(format!(
                "Segment [{}, {}] is shorter than two frames",
                from, to
            )));
        }
        info!(
            "Cutting frames {}..{} as segment [{:.3}s, {:.3}s]",
            start_frame, end_frame, from, to
        );

        self.render_segment(SILENCED_INPUT, from, to, SEGMENT_SILENT).await?;
        let silent_bytes = self.read_media_file(SEGMENT_SILENT).await?;

        let loud_streams = {
            let mut files = self.files.lock();
            files.reset_segment_audio();
            files.loud_input_audio_streams().to_vec()
        };
        let mut segment_audio = Vec::with_capacity(loud_streams.len());
        for (index, loud_stream) in loud_streams.iter().enumerate() {
            let segment = self.files.lock().add_segment_audio(index);
            self.render_segment(loud_stream, from, to, &segment).await?;
            let bytes = self.read_media_file(&segment).await?;
            segment_audio.push((segment, bytes));
        }

        let merged_audio = self.create_merged_audio_file().await?;
        let remux_inputs = if merged_audio.is_some() {
            vec![SEGMENT_MERGED_AAC.to_string()]
        } else {
            Vec::new()
        };
        let loud_video = self.add_audio_streams_to_segment(&remux_inputs).await?;

        let trimmed = trimmed_duration(start_frame, end_frame, frame_rate);
        let (compressed_video, encode_bitrate) = self.compress_segment(trimmed).await?;

        self.promote_segment(&silent_bytes, &loud_video.bytes, &loud_streams, &segment_audio)
            .await?;
        {
            let mut timeline = self.timeline.lock();
            let mut audio_sources = Vec::with_capacity(segment_audio.len());
            for (index, (segment, bytes)) in segment_audio.into_iter().enumerate() {
                match timeline.audio_track_index(index) {
                    Some(track) => {
                        let source =
                            MediaSource::new(segment, MIME_AAC, bytes).with_duration(to - from);
                        audio_sources.push((track, source));
                    }
                    None => warn!("No audio track for segment stream {}", index),
                }
            }
            let video = MediaSource::new(SILENCED_INPUT, MIME_MP4, silent_bytes.clone())
                .with_duration(to - from);
            timeline.adopt_segment(from, to, video, audio_sources)?;
        }

        info!("Cut finished: {:.3}s at {} bit/s", trimmed, encode_bitrate);
        Ok(CutReport {
            start_frame,
            end_frame,
            segment_start: from,
            segment_end: to,
            trimmed_duration: trimmed,
            encode_bitrate,
            silent_segment: Artifact::new(
                "trimmed-video-silent.mp4",
                MIME_MP4,
                "Trimmed video (silent)",
                silent_bytes,
            ),
            merged_audio,
            loud_video,
            compressed_video,
        })
    }
}
