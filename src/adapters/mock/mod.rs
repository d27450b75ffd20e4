//! In-memory media engine and mixer for tests
//!
//! The engine keeps its namespace in a map, records every argv it is given
//! and fakes the log lines a real ffmpeg would print: the input banner with
//! the media duration, showinfo lines for scripted keyframes and the end
//! sentinel. Every run "produces" its last argument.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::errors::DomainError;
use crate::domain::model::EngineLog;
use crate::pipeline::files::LOUD_INPUT;
use crate::pipeline::showinfo::END_SENTINEL;
use crate::ports::{AudioMixerPort, EngineLogSink, MediaEnginePort};

#[derive(Debug)]
pub struct MockMediaEngine {
    files: Mutex<HashMap<String, Vec<u8>>>,
    runs: Mutex<Vec<Vec<String>>>,
    /// Absolute keyframe times reported by scans covering them
    keyframes: Mutex<Vec<f64>>,
    duration: Option<f64>,
    emit_sentinel: bool,
    run_delay: Option<Duration>,
    fail_on: Option<String>,
}

impl Default for MockMediaEngine {
    fn default() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            runs: Mutex::new(Vec::new()),
            keyframes: Mutex::new(Vec::new()),
            duration: None,
            emit_sentinel: true,
            run_delay: None,
            fail_on: None,
        }
    }
}

impl MockMediaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyframes(self, times: Vec<f64>) -> Self {
        *self.keyframes.lock() = times;
        self
    }

    /// Duration printed in the banner of runs reading the loud input
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn without_sentinel(mut self) -> Self {
        self.emit_sentinel = false;
        self
    }

    /// Make every run take this long
    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = Some(delay);
        self
    }

    /// Fail every run with an argument containing `pattern`
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.fail_on = Some(pattern.into());
        self
    }

    pub fn runs(&self) -> Vec<Vec<String>> {
        self.runs.lock().clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().get(name).cloned()
    }

    fn scan_window(args: &[String]) -> Option<(f64, f64)> {
        let value = |flag: &str| {
            args.windows(2)
                .find(|pair| pair[0] == flag)
                .and_then(|pair| pair[1].parse::<f64>().ok())
        };
        Some((value("-ss")?, value("-t")?))
    }

    fn inputs(args: &[String]) -> impl Iterator<Item = &String> {
        args.windows(2)
            .filter(|pair| pair[0] == "-i")
            .map(|pair| &pair[1])
    }
}

fn banner_timestamp(seconds: f64) -> String {
    let hours = (seconds / 3600.0).floor();
    let minutes = ((seconds - hours * 3600.0) / 60.0).floor();
    let rest = seconds - hours * 3600.0 - minutes * 60.0;
    format!("{:02}:{:02}:{:05.2}", hours as u64, minutes as u64, rest)
}

#[async_trait]
impl MediaEnginePort for MockMediaEngine {
    async fn run(&self, args: &[String], logs: EngineLogSink) -> Result<(), DomainError> {
        self.runs.lock().push(args.to_vec());
        if let Some(delay) = self.run_delay {
            tokio::time::sleep(delay).await;
        }

        let missing = Self::inputs(args)
            .find(|input| !self.files.lock().contains_key(input.as_str()))
            .cloned();
        if let Some(input) = missing {
            let _ = logs.send(EngineLog::err(format!("{}: No such file or directory", input)));
            return Err(DomainError::EngineFailure(format!("{}: No such file or directory", input)));
        }

        if Self::inputs(args).any(|input| input == LOUD_INPUT) {
            if let Some(duration) = self.duration {
                let _ = logs.send(EngineLog::err(format!(
                    "  Duration: {}, start: 0.000000, bitrate: 1200 kb/s",
                    banner_timestamp(duration)
                )));
            }
        }

        if let Some(pattern) = &self.fail_on {
            if args.iter().any(|arg| arg.contains(pattern.as_str())) {
                let _ = logs.send(EngineLog::err("Conversion failed!"));
                return Err(DomainError::EngineFailure(format!(
                    "ffmpeg exited with status 1: {}",
                    args.join(" ")
                )));
            }
        }

        if args.iter().any(|arg| arg.contains("showinfo")) {
            if let Some((start, length)) = Self::scan_window(args) {
                let keyframes = self.keyframes.lock().clone();
                for (n, time) in keyframes
                    .iter()
                    .filter(|&&time| time >= start && time <= start + length)
                    .enumerate()
                {
                    let _ = logs.send(EngineLog::err(format!(
                        "[Parsed_showinfo_1 @ 0x5581] n:{:4} pts:{:7} pts_time:{} \
                         fmt:yuv420p iskey:1 type:I",
                        n,
                        ((time - start) * 15360.0).round() as u64,
                        time - start
                    )));
                }
            }
        }

        if let Some(output) = args.last().filter(|output| output.as_str() != "-") {
            let payload = format!("{}|{}", output, args.join(" ")).into_bytes();
            self.files.lock().insert(output.clone(), payload);
        }

        if self.emit_sentinel {
            let _ = logs.send(EngineLog::out(END_SENTINEL));
        }
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), DomainError> {
        self.files.lock().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, DomainError> {
        self.file(name)
            .ok_or_else(|| DomainError::FsFail(format!("{} not found in engine namespace", name)))
    }
}

/// Mixer that concatenates its inputs behind a WAV-like header
#[derive(Debug, Default)]
pub struct MockAudioMixer {
    calls: Mutex<Vec<usize>>,
}

impl MockAudioMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of inputs of each mix call
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AudioMixerPort for MockAudioMixer {
    async fn mix(&self, inputs: Vec<Vec<u8>>) -> Result<Vec<u8>, DomainError> {
        self.calls.lock().push(inputs.len());
        if inputs.is_empty() {
            return Err(DomainError::MixFailure("nothing to mix".to_string()));
        }
        let mut mixed = b"RIFF".to_vec();
        for input in inputs {
            mixed.extend(input);
        }
        Ok(mixed)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::model::LogChannel;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_banner_timestamp() {
        assert_eq!(banner_timestamp(12.0), "00:00:12.00");
        assert_eq!(banner_timestamp(3723.5), "01:02:03.50");
    }

    #[tokio::test]
    async fn test_run_produces_output_and_sentinel() {
        let engine = MockMediaEngine::new().with_duration(12.0);
        engine.write_file(LOUD_INPUT, b"video").await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let args = argv(&["-i", LOUD_INPUT, "-c", "copy", "-an", "silencedInput.mp4"]);
        engine.run(&args, tx).await.unwrap();

        assert!(engine.file("silencedInput.mp4").is_some());
        let mut lines = Vec::new();
        while let Ok(log) = rx.try_recv() {
            lines.push(log);
        }
        assert!(lines[0].text.contains("Duration: 00:00:12.00"));
        let last = lines.last().unwrap();
        assert_eq!(last.channel, LogChannel::Out);
        assert_eq!(last.text, END_SENTINEL);
    }

    #[tokio::test]
    async fn test_missing_input_fails() {
        let engine = MockMediaEngine::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = engine.run(&argv(&["-i", "nope.mp4", "out.mp4"]), tx).await;
        assert!(matches!(result, Err(DomainError::EngineFailure(_))));
        assert!(engine.file("out.mp4").is_none());
        assert_eq!(engine.run_count(), 1);
    }

    #[tokio::test]
    async fn test_scan_reports_relative_offsets() {
        let engine = MockMediaEngine::new().with_keyframes(vec![0.0, 4.0, 4.5, 9.0]);
        engine.write_file(LOUD_INPUT, b"video").await.unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let args = argv(&[
            "-ss",
            "4",
            "-i",
            LOUD_INPUT,
            "-t",
            "1.6",
            "-vf",
            "select='eq(pict_type,I)',showinfo",
            "-f",
            "null",
            "-",
        ]);
        engine.run(&args, tx).await.unwrap();

        let mut keyframe_lines = Vec::new();
        while let Ok(log) = rx.try_recv() {
            if log.text.contains("iskey:1") {
                keyframe_lines.push(log.text);
            }
        }
        assert_eq!(keyframe_lines.len(), 2);
        assert!(keyframe_lines[0].contains("pts_time:0 "));
        assert!(keyframe_lines[1].contains("pts_time:0.5"));
    }

    #[tokio::test]
    async fn test_mixer_rejects_empty_input() {
        let mixer = MockAudioMixer::new();
        assert!(mixer.mix(Vec::new()).await.is_err());
        let mixed = mixer.mix(vec![b"a".to_vec(), b"b".to_vec()]).await.unwrap();
        assert_eq!(mixed, b"RIFFab");
        assert_eq!(mixer.calls(), vec![0, 2]);
    }
}
