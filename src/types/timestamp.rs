//! Card timestamp parsing.
//!
//! Activity cards carry one of two timestamp encodings:
//!
//! ```text
//! 9:05 AM     wall clock, 12-hour ("h:mm a")
//! 05:30       elapsed video time, MM:SS
//! 01:05:30    elapsed video time, HH:MM:SS
//! ```
//!
//! The encoding is detected per string. Both are brought onto a common
//! minute scale before any comparison: clock times become minutes since
//! midnight, video times become elapsed seconds divided by sixty.

use std::mem;

use chrono::{NaiveTime, Timelike};

/// Minutes in one day, added when an interval crosses midnight.
pub const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// A parsed card timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardTimestamp {
    /// Wall-clock time, as minutes since midnight.
    Clock(u32),

    /// Elapsed video time, as seconds since the start of the recording.
    Video(u32),
}

impl CardTimestamp {
    /// Parses a timestamp in either encoding.
    ///
    /// Strings containing `AM` or `PM` (any case) are clock times; anything
    /// else is read as elapsed video time. Returns `None` when the string
    /// does not match the detected encoding.
    ///
    /// # Examples
    ///
    /// ```
    /// use dayflow_relay::types::CardTimestamp;
    ///
    /// assert_eq!(CardTimestamp::parse("9:05 AM"), Some(CardTimestamp::Clock(545)));
    /// assert_eq!(CardTimestamp::parse("12:10 AM"), Some(CardTimestamp::Clock(10)));
    /// assert_eq!(CardTimestamp::parse("05:30"), Some(CardTimestamp::Video(330)));
    /// assert_eq!(CardTimestamp::parse("01:00:05"), Some(CardTimestamp::Video(3605)));
    /// assert_eq!(CardTimestamp::parse("soon"), None);
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if is_clock_encoding(trimmed) {
            parse_clock(trimmed).map(CardTimestamp::Clock)
        } else {
            parse_video(trimmed).map(CardTimestamp::Video)
        }
    }

    /// Returns the timestamp on the common minute scale.
    pub fn minutes(self) -> f64 {
        match self {
            CardTimestamp::Clock(minutes) => f64::from(minutes),
            CardTimestamp::Video(seconds) => f64::from(seconds) / 60.0,
        }
    }

    /// Returns true if both timestamps use the same encoding.
    pub fn same_encoding(self, other: CardTimestamp) -> bool {
        mem::discriminant(&self) == mem::discriminant(&other)
    }
}

/// Converts a raw timestamp to minutes, treating unparseable input as zero.
///
/// Coverage checks are lenient here: a garbled timestamp collapses to the
/// start of the scale rather than aborting the comparison.
pub fn minutes_or_zero(raw: &str) -> f64 {
    match CardTimestamp::parse(raw) {
        Some(timestamp) => timestamp.minutes(),
        None => {
            tracing::warn!(timestamp = raw, "unparseable card timestamp, treating as 0");
            0.0
        }
    }
}

/// Computes the elapsed minutes between two raw timestamps.
///
/// Both endpoints must parse and share an encoding. When the end falls
/// before the start, the span is taken to cross midnight and a day is added.
///
/// # Examples
///
/// ```
/// use dayflow_relay::types::elapsed_minutes;
///
/// assert_eq!(elapsed_minutes("11:50 PM", "12:10 AM"), Some(20.0));
/// assert_eq!(elapsed_minutes("00:00", "09:54"), Some(9.9));
/// assert_eq!(elapsed_minutes("9:00 AM", "05:00"), None);
/// ```
pub fn elapsed_minutes(start: &str, end: &str) -> Option<f64> {
    let start = CardTimestamp::parse(start)?;
    let end = CardTimestamp::parse(end)?;
    if !start.same_encoding(end) {
        return None;
    }

    let (start, mut end) = (start.minutes(), end.minutes());
    if end < start {
        end += MINUTES_PER_DAY;
    }
    Some(end - start)
}

/// Renders a minute offset as a 12-hour clock string (`h:mm AM`).
///
/// Fractional minutes are truncated and offsets past midnight wrap around.
///
/// # Examples
///
/// ```
/// use dayflow_relay::types::format_clock;
///
/// assert_eq!(format_clock(0.0), "12:00 AM");
/// assert_eq!(format_clock(570.9), "9:30 AM");
/// assert_eq!(format_clock(780.0), "1:00 PM");
/// assert_eq!(format_clock(1450.0), "12:10 AM");
/// ```
pub fn format_clock(minutes: f64) -> String {
    let whole = minutes as i64;
    let hours = (whole / 60).rem_euclid(24);
    let mins = whole.rem_euclid(60);
    let period = if hours < 12 { "AM" } else { "PM" };
    let display_hour = match hours % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, mins, period)
}

fn is_clock_encoding(raw: &str) -> bool {
    let upper = raw.to_ascii_uppercase();
    upper.contains("AM") || upper.contains("PM")
}

fn parse_clock(raw: &str) -> Option<u32> {
    let time = NaiveTime::parse_from_str(&raw.to_ascii_uppercase(), "%I:%M %p").ok()?;
    Some(time.hour() * 60 + time.minute())
}

fn parse_video(raw: &str) -> Option<u32> {
    let parts = raw
        .split(':')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect::<Option<Vec<u32>>>()?;

    match parts.as_slice() {
        [minutes, seconds] => minutes.checked_mul(60)?.checked_add(*seconds),
        [hours, minutes, seconds] => hours
            .checked_mul(3600)?
            .checked_add(minutes.checked_mul(60)?)?
            .checked_add(*seconds),
        _ => None,
    }
}
