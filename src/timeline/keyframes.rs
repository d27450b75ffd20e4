//! Discovered keyframe timestamps and nearest-neighbor lookup

use tracing::warn;

/// Distance beyond which a nearest keyframe is reported as suspicious
pub const KEYFRAME_DISTANCE_WARNING_SECS: f64 = 2.0;

/// Keyframe presentation times in seconds, in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeIndex {
    timestamps: Vec<f64>,
    warning_distance: f64,
}

impl Default for KeyframeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyframeIndex {
    pub fn new() -> Self {
        Self {
            timestamps: Vec::new(),
            warning_distance: KEYFRAME_DISTANCE_WARNING_SECS,
        }
    }

    pub fn with_warning_distance(mut self, seconds: f64) -> Self {
        self.warning_distance = seconds;
        self
    }

    /// Insert a timestamp unless the exact value is already known.
    /// Returns true when the value was new.
    pub fn add(&mut self, timestamp: f64) -> bool {
        if self.timestamps.iter().any(|&known| known == timestamp) {
            return false;
        }
        self.timestamps.push(timestamp);
        true
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Keep the keyframes inside `[from, to]` and shift them so that `from`
    /// becomes zero
    pub fn rebase(&mut self, from: f64, to: f64) {
        self.timestamps.retain(|&time| time >= from && time <= to);
        for time in &mut self.timestamps {
            *time -= from;
        }
    }

    /// Closest stored timestamp to `target`; the earliest inserted wins ties
    pub fn nearest(&self, target: f64) -> Option<f64> {
        let mut iter = self.timestamps.iter().copied();
        let mut closest = iter.next()?;
        for time in iter {
            if (time - target).abs() < (closest - target).abs() {
                closest = time;
            }
        }

        let distance = (closest - target).abs();
        if distance > self.warning_distance {
            warn!(
                "Closest keyframe to {:.3}s is {:.3}s, {:.3}s away",
                target, closest, distance
            );
        }
        Some(closest)
    }
}
