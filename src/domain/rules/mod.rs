// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Default output size budget for the compressed cut (64 MiB)
pub const DEFAULT_BYTE_BUDGET: u64 = 64 * 1024 * 1024;

/// Default fraction of the budget-derived bitrate actually requested
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.95;

/// Business rules for the bitrate of the final compression pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitratePolicy {
    pub byte_budget: u64,
    pub safety_margin: f64,
}

impl Default for BitratePolicy {
    fn default() -> Self {
        Self {
            byte_budget: DEFAULT_BYTE_BUDGET,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }
}

impl BitratePolicy {
    pub fn new(byte_budget: u64, safety_margin: f64) -> Result<Self, DomainError> {
        if byte_budget == 0 {
            return Err(DomainError::BadArgs("Byte budget cannot be zero".to_string()));
        }
        if !(safety_margin > 0.0 && safety_margin <= 1.0) {
            return Err(DomainError::BadArgs(format!(
                "Safety margin must be in (0, 1], got {}",
                safety_margin
            )));
        }
        Ok(Self {
            byte_budget,
            safety_margin,
        })
    }

    /// Budget-derived bitrate for a trimmed duration
    pub fn target_bitrate(&self, trimmed_seconds: f64) -> Result<f64, DomainError> {
        if !(trimmed_seconds > 0.0) {
            return Err(DomainError::BadArgs(format!(
                "Trimmed duration must be positive, got {}",
                trimmed_seconds
            )));
        }
        Ok(self.byte_budget as f64 / trimmed_seconds)
    }

    /// Bitrate passed to the encoder, below the target by the safety margin
    pub fn encode_bitrate(&self, trimmed_seconds: f64) -> Result<u64, DomainError> {
        let target = self.target_bitrate(trimmed_seconds)?;
        Ok((target * self.safety_margin).floor() as u64)
    }
}

/// Duration in seconds between two frame indices
pub fn trimmed_duration(start_frame: u64, end_frame: u64, frame_rate: f64) -> f64 {
    (end_frame.saturating_sub(start_frame)) as f64 / frame_rate
}

/// Rules for placing the keyframe scan window
pub struct KeyframeSearchPlanner;

impl KeyframeSearchPlanner {
    /// Center a window on the target, keeping it inside the media
    pub fn window(target: f64, window: f64, duration: f64) -> KeyframeSearchWindow {
        let length = window.min(duration).max(0.0);
        let latest_start = (duration - length).max(0.0);
        let start = (target - window / 2.0).min(latest_start).max(0.0);
        KeyframeSearchWindow { start, length }
    }
}

/// Map a volume slider value in [0, 100] to a media volume in [0, 1]
pub fn slider_to_volume(value: f64) -> f64 {
    (value / 100.0).min(1.0).max(0.0)
}

#[cfg(test)]
mod tests;
