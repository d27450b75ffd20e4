//! Media engine backed by an `ffmpeg` executable
//!
//! The engine namespace is a working directory; every file name the
//! pipeline uses is resolved inside it and commands run with it as their
//! current directory.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{EngineLog, LogChannel};
use crate::pipeline::showinfo::END_SENTINEL;
use crate::ports::{EngineLogSink, MediaEnginePort};

/// Stderr lines kept for the failure message
const STDERR_TAIL_LINES: usize = 12;

pub struct FfmpegProcessEngine {
    program: PathBuf,
    workdir: PathBuf,
    // removed on drop
    _tempdir: TempDir,
}

impl FfmpegProcessEngine {
    /// Engine working in a fresh temporary directory
    pub fn new(program: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let tempdir = tempfile::Builder::new()
            .prefix("snipfix-")
            .tempdir()
            .map_err(|e| {
                DomainError::FsFail(format!("Failed to create working directory: {}", e))
            })?;
        Ok(Self {
            program: program.into(),
            workdir: tempdir.path().to_path_buf(),
            _tempdir: tempdir,
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Map a namespace name to a path; names are plain file names
    fn resolve(&self, name: &str) -> Result<PathBuf, DomainError> {
        let plain = Path::new(name)
            .file_name()
            .map(|file_name| file_name == name)
            .unwrap_or(false);
        if !plain || name == ".." {
            return Err(DomainError::BadArgs(format!(
                "Engine file names must not contain directories: {}",
                name
            )));
        }
        Ok(self.workdir.join(name))
    }
}

/// Forward every line of a child stream into the sink and return the tail
async fn forward_lines<R>(reader: R, channel: LogChannel, sink: EngineLogSink) -> VecDeque<String>
where
    R: AsyncRead + Unpin,
{
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line.clone());
                let _ = sink.send(EngineLog { channel, text: line });
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Stopped reading ffmpeg {:?} output: {}", channel, e);
                break;
            }
        }
    }
    tail
}

#[async_trait]
impl MediaEnginePort for FfmpegProcessEngine {
    async fn run(&self, args: &[String], logs: EngineLogSink) -> Result<(), DomainError> {
        debug!("Running {} {}", self.program.display(), args.join(" "));
        let mut child = Command::new(&self.program)
            .arg("-y")
            .arg("-nostdin")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let program = self.program.display();
                DomainError::EngineFailure(format!("failed to spawn {}: {}", program, e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DomainError::EngineFailure("failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DomainError::EngineFailure("failed to capture stderr".to_string()))?;

        let (status, _, stderr_tail) = tokio::join!(
            child.wait(),
            forward_lines(stdout, LogChannel::Out, logs.clone()),
            forward_lines(stderr, LogChannel::Err, logs.clone()),
        );
        let status = status.map_err(|e| {
            DomainError::EngineFailure(format!("I/O error waiting for ffmpeg: {}", e))
        })?;
        let _ = logs.send(EngineLog::out(END_SENTINEL));

        if !status.success() {
            let tail: Vec<String> = stderr_tail.into_iter().collect();
            return Err(DomainError::EngineFailure(format!(
                "ffmpeg exited with {}: {}",
                status,
                tail.join("\n")
            )));
        }
        Ok(())
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), DomainError> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::FsFail(format!("Failed to write {}: {}", path.display(), e)))
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, DomainError> {
        let path = self.resolve(name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| DomainError::FsFail(format!("Failed to read {}: {}", path.display(), e)))
    }
}
