//! Best-effort discovery of audio stream names from raw container bytes
//!
//! Container metadata stores track titles behind a `name` atom. The scan
//! looks for that 4-byte marker anywhere in the file and reads a
//! NUL-terminated title after it. It never fails: anything that does not
//! look like a readable title is skipped, so streams may be missed.

use tracing::{debug, trace};

/// Marker preceding a stream title
pub const NAME_MARKER: &[u8; 4] = b"name";

/// Longest title read after a marker
pub const MAX_NAME_LEN: usize = 256;

/// Printable ASCII and the Latin-1 supplement
fn is_readable(byte: u8) -> bool {
    matches!(byte, 0x20..=0x7E | 0xA0..=0xFF)
}

fn read_name(bytes: &[u8], start: usize) -> Option<String> {
    let tail = bytes.get(start..)?;
    let window = &tail[..tail.len().min(MAX_NAME_LEN)];
    let name = match window.iter().position(|&b| b == 0) {
        Some(end) => &window[..end],
        // ran off the end of the file before the terminator
        None if window.len() < MAX_NAME_LEN => return None,
        None => window,
    };
    if name.is_empty() || !name.iter().all(|&b| is_readable(b)) {
        return None;
    }
    Some(name.iter().map(|&b| char::from(b)).collect())
}

/// Every readable title found after a `name` marker, in file order
pub fn extract_audio_stream_names(bytes: &[u8]) -> Vec<String> {
    let names: Vec<String> = bytes
        .windows(NAME_MARKER.len())
        .enumerate()
        .filter(|(_, window)| *window == NAME_MARKER)
        .filter_map(|(offset, _)| {
            let name = read_name(bytes, offset + NAME_MARKER.len());
            if name.is_none() {
                trace!("Skipping unreadable name at byte {}", offset);
            }
            name
        })
        .collect();
    debug!("Stream name scan of {} bytes found {:?}", bytes.len(), names);
    names
}
