//! Parsing of media engine log lines

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::model::{EngineLog, LogChannel};

/// Marker on showinfo lines describing a keyframe
pub const KEYFRAME_MARKER: &str = "iskey:1";

/// Field prefix carrying a frame's presentation time
pub const PTS_TIME_PREFIX: &str = "pts_time:";

/// Line the engine prints on its out channel after every command
pub const END_SENTINEL: &str = "FFMPEG_END";

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration: (\d+):(\d+):([\d.]+)").expect("invalid duration regex")
});

pub fn is_keyframe_line(log: &EngineLog) -> bool {
    log.channel == LogChannel::Err && log.text.contains(KEYFRAME_MARKER)
}

pub fn is_end_sentinel(log: &EngineLog) -> bool {
    log.channel == LogChannel::Out && log.text.contains(END_SENTINEL)
}

/// Every `pts_time:<float>` field on a showinfo line
pub fn parse_pts_times(line: &str) -> Vec<f64> {
    line.split_whitespace()
        .filter_map(|field| field.strip_prefix(PTS_TIME_PREFIX))
        .filter_map(|value| value.parse::<f64>().ok())
        .collect()
}

/// Input duration from a `Duration: HH:MM:SS.ss` banner line
pub fn parse_duration(line: &str) -> Option<f64> {
    let caps = DURATION_RE.captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
