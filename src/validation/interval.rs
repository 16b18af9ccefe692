//! Time intervals on the common minute scale and their merging.

use crate::types::{ActivityCard, MINUTES_PER_DAY, minutes_or_zero};

/// Intervals whose edges are within this many minutes are merged.
pub const MERGE_EPSILON_MINUTES: f64 = 1.0;

/// A span of minutes. `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInterval {
    pub start: f64,
    pub end: f64,
}

impl TimeInterval {
    /// Creates an interval, normalizing a midnight crossing.
    ///
    /// If `end < start` a day is added to `end`. An end that still falls
    /// short after that (only possible for multi-day video offsets) is
    /// clamped so the interval is empty rather than inverted.
    pub fn new(start: f64, end: f64) -> Self {
        let mut end = end;
        if end < start {
            end += MINUTES_PER_DAY;
        }
        TimeInterval {
            start,
            end: end.max(start),
        }
    }

    /// Builds the interval a card claims to cover.
    ///
    /// Unparseable timestamps count as minute zero.
    pub fn from_card(card: &ActivityCard) -> Self {
        TimeInterval::new(minutes_or_zero(&card.start_time), minutes_or_zero(&card.end_time))
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Merges intervals into a sorted, non-overlapping list with the same union.
///
/// Two intervals merge when the next one starts no more than
/// [`MERGE_EPSILON_MINUTES`] after the accumulated one ends, so adjacent
/// cards with a sub-minute seam become one span.
///
/// # Examples
///
/// ```
/// use dayflow_relay::validation::{TimeInterval, merge_intervals};
///
/// let merged = merge_intervals(&[
///     TimeInterval::new(30.0, 40.0),
///     TimeInterval::new(0.0, 10.0),
///     TimeInterval::new(10.5, 20.0),
/// ]);
/// assert_eq!(merged, vec![TimeInterval::new(0.0, 20.0), TimeInterval::new(30.0, 40.0)]);
/// ```
pub fn merge_intervals(intervals: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end + MERGE_EPSILON_MINUTES => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}
