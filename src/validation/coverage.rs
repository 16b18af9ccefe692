//! Coverage checking: does a proposed set of intervals cover a required set?
//!
//! The scan walks a cursor across each merged required interval. At every
//! step it either jumps to the furthest end of a proposed interval that is
//! within slack of the cursor, or records a gap up to the next proposed
//! start. Gaps no longer than the slack are tolerated.
//!
//! ```text
//! required   |==============================|
//! proposed   |=========|      |==============|
//!                      ^ gap  ^
//! ```

use std::fmt;

use thiserror::Error;

use super::interval::{TimeInterval, merge_intervals};
use crate::types::format_clock;

/// Tolerance, in minutes, on each side of a proposed interval.
pub const COVERAGE_SLACK_MINUTES: f64 = 3.0;

/// Proposed intervals shorter than this are ignored as noise.
pub const MIN_PROPOSED_MINUTES: f64 = 0.1;

/// The cursor always advances at least this far when an interval matches.
pub const MIN_CURSOR_STEP_MINUTES: f64 = 0.01;

/// Upper bound on scan iterations for a single required interval.
pub const MAX_SCAN_ITERATIONS: usize = 10_000;

/// The scan did not terminate within [`MAX_SCAN_ITERATIONS`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoverageError {
    #[error("Time coverage validation loop exceeded safety limit - possible infinite loop detected")]
    IterationLimitExceeded { required: TimeInterval },
}

/// An uncovered stretch of a required interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    pub start: f64,
    pub end: f64,
}

impl Gap {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} ({} min)",
            format_clock(self.start),
            format_clock(self.end),
            self.duration() as i64
        )
    }
}

/// The significant gaps found by [`check_coverage`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub gaps: Vec<Gap>,
}

impl CoverageReport {
    pub fn is_covered(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Renders the gaps as a comma-separated list.
    pub fn describe(&self) -> String {
        self.gaps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Checks that `proposed` covers `required`, allowing
/// [`COVERAGE_SLACK_MINUTES`] of tolerance.
///
/// `required` is merged before scanning; `proposed` is used as-is apart from
/// dropping noise intervals. Only gaps strictly longer than the slack are
/// reported.
///
/// # Errors
///
/// Returns [`CoverageError::IterationLimitExceeded`] if a single required
/// interval needs more than [`MAX_SCAN_ITERATIONS`] steps. The result is
/// never silently truncated.
pub fn check_coverage(
    required: &[TimeInterval],
    proposed: &[TimeInterval],
) -> Result<CoverageReport, CoverageError> {
    let required = merge_intervals(required);
    let proposed: Vec<TimeInterval> = proposed
        .iter()
        .copied()
        .filter(|interval| interval.duration() >= MIN_PROPOSED_MINUTES)
        .collect();

    let mut gaps = Vec::new();
    for interval in required {
        scan(interval, &proposed, &mut gaps)?;
    }

    gaps.retain(|gap| gap.duration() > COVERAGE_SLACK_MINUTES);
    Ok(CoverageReport { gaps })
}

fn scan(
    required: TimeInterval,
    proposed: &[TimeInterval],
    gaps: &mut Vec<Gap>,
) -> Result<(), CoverageError> {
    let mut cursor = required.start;
    let mut iterations = 0;

    while cursor < required.end {
        if iterations == MAX_SCAN_ITERATIONS {
            return Err(CoverageError::IterationLimitExceeded { required });
        }
        iterations += 1;

        if let Some(reach) = furthest_reach(cursor, proposed) {
            cursor = (cursor + MIN_CURSOR_STEP_MINUTES).max(reach);
            continue;
        }

        let next_start = proposed
            .iter()
            .map(|interval| interval.start)
            .filter(|&start| start > cursor && start < required.end)
            .min_by(f64::total_cmp);

        match next_start {
            Some(next) => {
                gaps.push(Gap {
                    start: cursor,
                    end: next,
                });
                cursor = next;
            }
            None => {
                gaps.push(Gap {
                    start: cursor,
                    end: required.end,
                });
                break;
            }
        }
    }
    Ok(())
}

/// The furthest end among proposed intervals whose slack window contains
/// `cursor` and which still extend past it.
fn furthest_reach(cursor: f64, proposed: &[TimeInterval]) -> Option<f64> {
    proposed
        .iter()
        .filter(|interval| {
            interval.start - COVERAGE_SLACK_MINUTES <= cursor
                && cursor <= interval.end + COVERAGE_SLACK_MINUTES
        })
        // An interval already behind the cursor would only creep it forward
        // through its trailing slack and hide real holes.
        .filter(|interval| interval.end > cursor)
        .map(|interval| interval.end)
        .max_by(f64::total_cmp)
}
