//! Interval reconciliation for activity cards.
//!
//! A freshly generated batch of cards replaces an existing batch for the
//! same stretch of time. Before it is accepted it must:
//!
//! - cover every minute the existing cards covered, within a few minutes
//!   of slack ([`coverage`]), and
//! - contain no card shorter than ten minutes, except possibly the last
//!   ([`duration`]).
//!
//! Everything here is pure. Rejections carry a human-readable message that
//! is fed back to the card generator verbatim, so its wording is fixed.

pub mod coverage;
pub mod duration;
pub mod interval;

use std::fmt::Write as _;

pub use coverage::{CoverageError, CoverageReport, Gap, check_coverage};
pub use duration::{MIN_CARD_MINUTES, ShortCard, find_short_card};
pub use interval::{TimeInterval, merge_intervals};

use crate::types::ActivityCard;

/// Outcome of validating a batch of cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// The rejection message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(message) => Some(message),
        }
    }
}

/// Checks that `new` covers the time span of `existing`.
///
/// An empty `existing` batch is trivially covered.
///
/// # Errors
///
/// Propagates [`CoverageError`] when the scan exceeds its iteration bound.
pub fn validate_time_coverage(
    existing: &[ActivityCard],
    new: &[ActivityCard],
) -> Result<Verdict, CoverageError> {
    if existing.is_empty() {
        return Ok(Verdict::Accepted);
    }

    let required: Vec<TimeInterval> = existing.iter().map(TimeInterval::from_card).collect();
    let proposed: Vec<TimeInterval> = new.iter().map(TimeInterval::from_card).collect();

    let report = check_coverage(&required, &proposed)?;
    if report.is_covered() {
        return Ok(Verdict::Accepted);
    }

    tracing::debug!(
        gaps = report.gaps.len(),
        existing = existing.len(),
        new = new.len(),
        "card batch leaves time uncovered"
    );
    Ok(Verdict::Rejected(coverage_message(&report, existing, new)))
}

/// Checks that no card but the last is shorter than [`MIN_CARD_MINUTES`].
pub fn validate_timeline(cards: &[ActivityCard]) -> Verdict {
    match find_short_card(cards) {
        Some(short) => Verdict::Rejected(short.to_string()),
        None => Verdict::Accepted,
    }
}

/// Runs both checks: coverage against `existing`, then card durations.
///
/// The first rejection wins.
pub fn validate_replacement(
    existing: &[ActivityCard],
    new: &[ActivityCard],
) -> Result<Verdict, CoverageError> {
    let coverage = validate_time_coverage(existing, new)?;
    if !coverage.is_valid() {
        return Ok(coverage);
    }
    Ok(validate_timeline(new))
}

fn coverage_message(
    report: &CoverageReport,
    existing: &[ActivityCard],
    new: &[ActivityCard],
) -> String {
    let mut message = format!("Missing coverage for time segments: {}", report.describe());
    message.push_str("\n\n📥 INPUT CARDS:");
    push_card_lines(&mut message, existing);
    message.push_str("\n\n📤 OUTPUT CARDS:");
    push_card_lines(&mut message, new);
    message
}

fn push_card_lines(out: &mut String, cards: &[ActivityCard]) {
    for (i, card) in cards.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "\n  {}. {} - {}: {}",
            i + 1,
            card.start_time,
            card.end_time,
            card.title
        );
    }
}
