//! Start/end bounds and playhead in frame units

use tracing::debug;

use crate::domain::errors::DomainError;

/// Owns the two cut bounds and the playhead.
///
/// Invariants held after every setter:
/// `0 <= start < end <= total_frames - 1` and `start <= playhead <= end`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsController {
    total_frames: u64,
    start: u64,
    end: u64,
    playhead: u64,
}

impl BoundsController {
    /// Create bounds spanning the whole media
    pub fn new(total_frames: u64) -> Result<Self, DomainError> {
        if total_frames < 2 {
            return Err(DomainError::BadArgs(format!(
                "Media needs at least 2 frames to place bounds, got {}",
                total_frames
            )));
        }
        Ok(Self {
            total_frames,
            start: 0,
            end: total_frames - 1,
            playhead: 0,
        })
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn max_frame(&self) -> u64 {
        self.total_frames - 1
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn playhead(&self) -> u64 {
        self.playhead
    }

    /// Move the start bound, keeping at least one frame before the end bound
    pub fn set_start(&mut self, frame: u64) -> u64 {
        let mut start = frame.min(self.max_frame());
        if self.end <= start + 1 {
            start = self.end - 1;
        }
        if start != frame {
            debug!("Start bound {} clamped to {}", frame, start);
        }
        self.start = start;
        self.clamp_playhead();
        start
    }

    /// Move the end bound, keeping at least one frame after the start bound
    pub fn set_end(&mut self, frame: u64) -> u64 {
        let mut end = frame.min(self.max_frame());
        if end <= self.start + 1 {
            end = self.start + 1;
        }
        if end != frame {
            debug!("End bound {} clamped to {}", frame, end);
        }
        self.end = end;
        self.clamp_playhead();
        end
    }

    /// Move the playhead, clamped into the bounds
    pub fn set_playhead(&mut self, frame: u64) -> u64 {
        self.playhead = frame.clamp(self.start, self.end);
        self.playhead
    }

    fn clamp_playhead(&mut self) {
        self.playhead = self.playhead.clamp(self.start, self.end);
    }

    /// Time of the start bound at a frame rate
    pub fn start_time(&self, frame_rate: f64) -> f64 {
        self.start as f64 / frame_rate
    }

    /// Time of the end bound at a frame rate
    pub fn end_time(&self, frame_rate: f64) -> f64 {
        self.end as f64 / frame_rate
    }
}
