//! Engine namespace: the file names each pipeline stage reads and writes

pub const LOUD_INPUT: &str = "loudInput.mp4";
pub const SILENCED_INPUT: &str = "silencedInput.mp4";
pub const SEGMENT_SILENT: &str = "segmentBetweenBoundsSilent.mp4";
pub const SEGMENT_MERGED_WAV: &str = "segmentBetweenBoundsMergedAudio.wav";
pub const SEGMENT_MERGED_AAC: &str = "segmentBetweenBoundsMergedAudio.aac";
pub const SEGMENT_LOUD: &str = "segmentBetweenBoundsLoud.mp4";
pub const SEGMENT_LOUD_COMPRESSED: &str = "segmentBetweenBoundsLoudCompressed.mp4";

const FIXED: [&str; 7] = [
    LOUD_INPUT,
    SILENCED_INPUT,
    SEGMENT_SILENT,
    SEGMENT_MERGED_WAV,
    SEGMENT_MERGED_AAC,
    SEGMENT_LOUD,
    SEGMENT_LOUD_COMPRESSED,
];

/// Known file names; per-stream lists only grow, except the segment list
/// which is reset before each cut
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileNamespace {
    loud_input_audio_streams: Vec<String>,
    segment_audio_streams: Vec<String>,
}

impl FileNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        FIXED.contains(&name)
            || self.loud_input_audio_streams.iter().any(|f| f == name)
            || self.segment_audio_streams.iter().any(|f| f == name)
    }

    pub fn loud_input_audio_streams(&self) -> &[String] {
        &self.loud_input_audio_streams
    }

    pub fn segment_audio_streams(&self) -> &[String] {
        &self.segment_audio_streams
    }

    /// Register the extract of audio stream `index` and return its name
    pub fn add_loud_input_audio(&mut self, index: usize) -> String {
        let name = format!("loudInputAudio{}.aac", index);
        self.loud_input_audio_streams.push(name.clone());
        name
    }

    pub fn add_segment_audio(&mut self, index: usize) -> String {
        let name = format!("segmentBetweenBoundsAudio{}.aac", index);
        self.segment_audio_streams.push(name.clone());
        name
    }

    /// Forget segment audio left over from a previous cut
    pub fn reset_segment_audio(&mut self) {
        self.segment_audio_streams.clear();
    }
}
