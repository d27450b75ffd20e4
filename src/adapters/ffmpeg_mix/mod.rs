//! Audio mixer running ffmpeg's `amix` filter

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::ports::AudioMixerPort;

/// Mixes encoded audio buffers into one WAV buffer
pub struct FfmpegAmixAdapter {
    program: PathBuf,
}

impl FfmpegAmixAdapter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn mix_args(input_count: usize) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-nostdin".to_string()];
        for i in 0..input_count {
            args.push("-i".to_string());
            args.push(format!("input{}.aac", i));
        }
        args.push("-filter_complex".to_string());
        args.push(format!("amix=inputs={}:duration=longest", input_count));
        args.push("mixed.wav".to_string());
        args
    }
}

#[async_trait]
impl AudioMixerPort for FfmpegAmixAdapter {
    async fn mix(&self, inputs: Vec<Vec<u8>>) -> Result<Vec<u8>, DomainError> {
        if inputs.is_empty() {
            return Err(DomainError::MixFailure("no audio inputs".to_string()));
        }

        let dir = tempfile::Builder::new()
            .prefix("snipfix-mix-")
            .tempdir()
            .map_err(|e| DomainError::FsFail(format!("Failed to create mix directory: {}", e)))?;
        for (i, input) in inputs.iter().enumerate() {
            let path = dir.path().join(format!("input{}.aac", i));
            tokio::fs::write(&path, input).await.map_err(|e| {
                DomainError::FsFail(format!("Failed to write {}: {}", path.display(), e))
            })?;
        }

        let args = Self::mix_args(inputs.len());
        debug!("Mixing {} audio streams: {}", inputs.len(), args.join(" "));
        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(dir.path())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                let program = self.program.display();
                DomainError::MixFailure(format!("failed to spawn {}: {}", program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(DomainError::MixFailure(format!(
                "amix exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join("\n")
            )));
        }

        tokio::fs::read(dir.path().join("mixed.wav"))
            .await
            .map_err(|e| DomainError::MixFailure(format!("Mixed output missing: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_args() {
        let args = FfmpegAmixAdapter::mix_args(2);
        assert_eq!(
            args.join(" "),
            "-y -nostdin -i input0.aac -i input1.aac \
             -filter_complex amix=inputs=2:duration=longest mixed.wav"
        );
    }

    #[tokio::test]
    async fn test_empty_mix_is_rejected() {
        let mixer = FfmpegAmixAdapter::new("ffmpeg");
        assert!(matches!(mixer.mix(Vec::new()).await, Err(DomainError::MixFailure(_))));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let mixer = FfmpegAmixAdapter::new("nonexistent_ffmpeg_xyz_12345");
        let result = mixer.mix(vec![b"aac".to_vec()]).await;
        assert!(matches!(result, Err(DomainError::MixFailure(_))));
    }
}
