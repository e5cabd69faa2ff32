use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]").unwrap();
}

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}

/// Millisecond timestamp that never repeats within the process.
///
/// Bursts inside one millisecond run ahead of the wall clock by one per call
/// and fall back in line once the clock catches up.
pub fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let previous = match LAST_STAMP.fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
        Some(now.max(last + 1))
    }) {
        Ok(last) | Err(last) => last,
    };
    now.max(previous + 1)
}

pub fn normalize_extension(extension: &str) -> String {
    let ext = sanitize(extension.trim().trim_start_matches('.')).to_ascii_lowercase();
    if ext.is_empty() {
        "bin".to_string()
    } else {
        ext
    }
}

/// `{prefix}-{stamp}.{extension}`
pub fn file_name(prefix: &str, stamp: i64, extension: &str) -> String {
    format!("{}-{}.{}", sanitize(prefix), stamp, normalize_extension(extension))
}
