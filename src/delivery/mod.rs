//! Outbound webhook delivery.
//!
//! A [`DeliverySender`] POSTs one payload to the configured endpoint,
//! retrying with exponential backoff per its [`RetryPolicy`]. The network
//! itself sits behind the [`HttpTransport`] trait.

pub mod error;
pub mod retry;
pub mod sender;
pub mod transport;

pub use error::{AttemptError, DeliveryError};
pub use retry::RetryPolicy;
pub use sender::{DeliveryResult, DeliverySender};
pub use transport::{HttpTransport, ReqwestTransport, WebhookRequest};
