//! Queue file naming.
//!
//! ```text
//! 1760875200.000001-3f2a9c1b.json   queued payload
//! .claimed-<uuid>.json              claimed by a consumer, being read
//! .tmp-<uuid>.json                  being written by a producer
//! ```
//!
//! Visible names sort in creation order. Hidden names never take part in
//! enumeration.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use uuid::Uuid;

pub const PAYLOAD_EXTENSION: &str = "json";
pub const CLAIMED_PREFIX: &str = ".claimed-";
pub const TEMP_PREFIX: &str = ".tmp-";

const SUFFIX_LEN: usize = 8;

static LAST_STAMP_MICROS: AtomicI64 = AtomicI64::new(0);

/// Returns a creation stamp in microseconds that is strictly greater than
/// any stamp previously returned in this process.
fn next_stamp_micros() -> i64 {
    let now = Utc::now().timestamp_micros();
    let previous = LAST_STAMP_MICROS
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    now.max(previous + 1)
}

/// A fresh name for a queued payload: `<secs>.<micros>-<suffix>.json`.
pub fn payload_file_name() -> String {
    let stamp = next_stamp_micros();
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}.{:06}-{}.{}",
        stamp.div_euclid(1_000_000),
        stamp.rem_euclid(1_000_000),
        &suffix[..SUFFIX_LEN],
        PAYLOAD_EXTENSION
    )
}

/// A fresh hidden name for a file claimed by a consumer.
pub fn claimed_file_name() -> String {
    format!("{}{}.{}", CLAIMED_PREFIX, Uuid::new_v4(), PAYLOAD_EXTENSION)
}

/// A fresh hidden name for a file being written.
pub fn temp_file_name() -> String {
    format!("{}{}.{}", TEMP_PREFIX, Uuid::new_v4(), PAYLOAD_EXTENSION)
}

/// True for names that are queued payloads.
pub fn is_payload_name(name: &str) -> bool {
    !name.starts_with('.') && has_payload_extension(name)
}

/// True for names left by a claiming consumer.
pub fn is_claimed_name(name: &str) -> bool {
    name.starts_with(CLAIMED_PREFIX) && has_payload_extension(name)
}

/// True for names of files still being written, or abandoned mid-write.
pub fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && has_payload_extension(name)
}

fn has_payload_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext == PAYLOAD_EXTENSION)
}
