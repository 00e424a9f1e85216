// src/core/sniff.rs

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes inspected when deciding between text and binary content.
const SNIFF_LEN: u64 = 8192;

const TEXT_PLAIN: &str = "text/plain";
const OCTET_STREAM: &str = "application/octet-stream";

/// Detects the MIME type of a local file from its content.
///
/// Returns `None` when the file cannot be read (missing, a directory, no permission).
/// Callers treat that as "no MIME information", never as an error.
pub fn detect_mime(path: &Path) -> Option<String> {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => return Some(kind.mime_type().to_string()),
        Ok(None) => {}
        Err(e) => {
            log::debug!("MIME detection skipped for '{}': {}", path.display(), e);
            return None;
        }
    }

    // No magic number matched: fall back to a text/binary heuristic.
    let mut head = Vec::new();
    let read = File::open(path).and_then(|f| f.take(SNIFF_LEN).read_to_end(&mut head));
    if let Err(e) = read {
        log::debug!("MIME detection skipped for '{}': {}", path.display(), e);
        return None;
    }

    let is_text = match std::str::from_utf8(&head) {
        Ok(_) => true,
        // A multi-byte character cut by the read limit is still text.
        Err(e) => e.error_len().is_none(),
    };
    Some(if is_text { TEXT_PLAIN } else { OCTET_STREAM }.to_string())
}
