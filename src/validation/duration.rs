//! Minimum card duration.

use std::fmt;

use crate::types::ActivityCard;

/// Every card except the last must last at least this long.
pub const MIN_CARD_MINUTES: f64 = 10.0;

/// The first card found below [`MIN_CARD_MINUTES`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShortCard {
    /// Zero-based position in the batch.
    pub index: usize,
    pub title: String,
    pub duration_minutes: f64,
}

impl fmt::Display for ShortCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Card {} '{}' is only {:.1} minutes long",
            self.index + 1,
            self.title,
            self.duration_minutes
        )
    }
}

/// Card duration in minutes; unparseable or mixed-encoding cards count as 0.
pub fn card_minutes(card: &ActivityCard) -> f64 {
    match card.duration_minutes() {
        Some(minutes) => minutes,
        None => {
            tracing::warn!(
                start = %card.start_time,
                end = %card.end_time,
                "cannot compute card duration, treating as 0 minutes"
            );
            0.0
        }
    }
}

/// Returns the first non-final card shorter than [`MIN_CARD_MINUTES`].
///
/// The final card of a batch may be short: it is usually still in progress.
pub fn find_short_card(cards: &[ActivityCard]) -> Option<ShortCard> {
    let (_last, leading) = cards.split_last()?;
    leading.iter().enumerate().find_map(|(index, card)| {
        let duration_minutes = card_minutes(card);
        (duration_minutes < MIN_CARD_MINUTES).then(|| ShortCard {
            index,
            title: card.title.clone(),
            duration_minutes,
        })
    })
}
