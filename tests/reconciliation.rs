//! Property tests for card batch validation through the public API.

use dayflow_relay::types::{ActivityCard, format_clock};
use dayflow_relay::validation::{Verdict, validate_replacement, validate_time_coverage};
use proptest::prelude::*;

/// Back-to-back clock cards starting somewhere in the morning.
fn arb_contiguous_cards() -> impl Strategy<Value = Vec<ActivityCard>> {
    (0u32..600, prop::collection::vec(10u32..60, 3..8)).prop_map(|(start, durations)| {
        let mut cursor = start;
        durations
            .into_iter()
            .enumerate()
            .map(|(i, minutes)| {
                let card = ActivityCard::new(
                    format_clock(f64::from(cursor)),
                    format_clock(f64::from(cursor + minutes)),
                    "Work",
                    format!("Task {i}"),
                );
                cursor += minutes;
                card
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn a_batch_replaces_itself(cards in arb_contiguous_cards()) {
        prop_assert_eq!(validate_replacement(&cards, &cards).unwrap(), Verdict::Accepted);
    }

    #[test]
    fn one_spanning_card_replaces_the_batch(cards in arb_contiguous_cards()) {
        let first = cards.first().unwrap();
        let last = cards.last().unwrap();
        let spanning = [ActivityCard::new(
            first.start_time.clone(),
            last.end_time.clone(),
            "Work",
            "Everything",
        )];
        prop_assert_eq!(validate_replacement(&cards, &spanning).unwrap(), Verdict::Accepted);
    }

    #[test]
    fn dropping_a_middle_card_is_rejected(
        cards in arb_contiguous_cards(),
        pick in any::<prop::sample::Index>(),
    ) {
        let dropped = 1 + pick.index(cards.len() - 2);
        let mut remaining = cards.clone();
        let removed = remaining.remove(dropped);

        let verdict = validate_time_coverage(&cards, &remaining).unwrap();
        let message = verdict.error().unwrap_or_default().to_string();
        prop_assert!(
            message.starts_with(&format!(
                "Missing coverage for time segments: {}-{}",
                removed.start_time, removed.end_time
            )),
            "unexpected verdict: {}",
            message
        );
    }
}
