//! Dayflow Relay - activity card reconciliation and crash-safe webhook delivery.
//!
//! Two subsystems:
//!
//! - **Interval reconciliation** ([`validation`]): decides whether a freshly
//!   generated batch of activity cards is a gap-free, well-formed
//!   replacement for the span it claims to cover.
//! - **Durable delivery** ([`queue`], [`delivery`], [`relay`]): posts
//!   accepted results to a webhook with bounded retry, parking anything
//!   undeliverable in a file-backed queue that survives crashes.

pub mod config;
pub mod delivery;
pub mod format;
pub mod queue;
pub mod relay;
pub mod security;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;
