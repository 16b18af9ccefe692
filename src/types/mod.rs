//! Core domain types for activity card reconciliation.
//!
//! Cards and their timestamps are the only shared vocabulary between the
//! validators, the formatters and the relay.

pub mod card;
pub mod timestamp;

pub use card::{ActivityCard, AppSites, Distraction};
pub use timestamp::{
    CardTimestamp, MINUTES_PER_DAY, elapsed_minutes, format_clock, minutes_or_zero,
};
