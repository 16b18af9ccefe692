//! Crash-safe, file-backed delivery queue.
//!
//! Payloads that could not be delivered are parked here until the next
//! flush. The queue is a plain directory; every state change is a single
//! atomic create, rename or unlink, so a crash at any point leaves each
//! payload either queued, claimed, or gone after being read.

pub mod durable;
pub mod name;
pub mod store;

pub use store::{PersistentQueue, QueueError, Result};
