//! Markdown activity summaries.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::types::ActivityCard;
use crate::validation::duration::card_minutes;

/// Renders cards as a Markdown summary grouped by category.
///
/// ```text
/// # Activity Summary
///
/// ## Work
///
/// - **Refactor parser** (9:00 AM - 10:05 AM): Split the lexer (1h 5m)
///
/// ---
/// **Total: 1h 5m**
/// ```
///
/// Categories are sorted; cards keep their input order within a category.
/// There is no trailing newline.
pub fn format_summary(cards: &[ActivityCard]) -> String {
    let mut out = String::from("# Activity Summary\n\n");
    if cards.is_empty() {
        out.push_str("No activities recorded.");
        return out;
    }

    let mut by_category: BTreeMap<&str, Vec<&ActivityCard>> = BTreeMap::new();
    for card in cards {
        by_category.entry(card.category.as_str()).or_default().push(card);
    }

    let mut total_minutes = 0.0;
    for (category, cards) in by_category {
        let _ = write!(out, "## {category}\n\n");
        for card in cards {
            let minutes = card_minutes(card);
            total_minutes += minutes;
            let _ = write!(
                out,
                "- **{}** ({} - {})",
                card.title, card.start_time, card.end_time
            );
            if !card.summary.is_empty() {
                let _ = write!(out, ": {}", card.summary);
            }
            let _ = writeln!(out, " ({})", format_duration(minutes));
        }
        out.push('\n');
    }

    let _ = write!(out, "---\n**Total: {}**", format_duration(total_minutes));
    out
}

/// Formats minutes as `1h 5m`, `2h` or `45m`. Seconds are dropped.
pub fn format_duration(minutes: f64) -> String {
    let total = (minutes.max(0.0) * 60.0) as u64 / 60;
    let (hours, mins) = (total / 60, total % 60);
    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}
