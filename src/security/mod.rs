//! Input hardening for the outbound webhook.
//!
//! Validators for user-supplied URLs and headers, and redaction of URLs
//! before they reach the logs.

pub mod header;
pub mod redact;
pub mod webhook_url;

pub use header::{MAX_HEADER_VALUE_LEN, is_valid_header_name, is_valid_header_value};
pub use redact::redact_url;
pub use webhook_url::{UrlRejection, check_webhook_url, is_valid_webhook_url};
