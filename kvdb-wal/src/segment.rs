//! Segment filename scheme.
//!
//! Segments are named `wal_{session_id}_{segment_no:08d}.log`. Zero-padding the
//! segment number to 8 digits is load-bearing: a lexicographic directory listing
//! gives chronological order within a session without parsing every filename.

use std::path::{Path, PathBuf};

/// Builds the filename for segment `segment_no` of session `session_id`.
pub fn segment_filename(session_id: u64, segment_no: u64) -> String {
    format!("wal_{session_id}_{segment_no:08}.log")
}

/// Builds the full path for a segment under `dir`.
pub fn segment_path(dir: &Path, session_id: u64, segment_no: u64) -> PathBuf {
    dir.join(segment_filename(session_id, segment_no))
}

/// Parses `(session_id, segment_no)` back out of a segment filename, if it
/// matches the `wal_<u64>_<8-digit>.log` pattern.
pub fn parse_segment_filename(name: &str) -> Option<(u64, u64)> {
    let rest = name.strip_prefix("wal_")?;
    let rest = rest.strip_suffix(".log")?;
    let (session_part, segment_part) = rest.split_once('_')?;
    if segment_part.len() != 8 {
        return None;
    }
    let session_id = session_part.parse().ok()?;
    let segment_no = segment_part.parse().ok()?;
    Some((session_id, segment_no))
}
