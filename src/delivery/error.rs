//! Delivery error types.
//!
//! Two layers:
//!
//! - [`DeliveryError`] is a configuration or programming problem. It is
//!   raised before anything goes on the wire and is never retried.
//! - [`AttemptError`] is the outcome of one failed POST. It is recorded in
//!   the [`DeliveryResult`](super::DeliveryResult) and retried.

use thiserror::Error;

use crate::security::UrlRejection;

/// A sender could not be built or a request could not be prepared.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The URL is empty or cannot be parsed.
    #[error("invalid webhook URL: {0}")]
    InvalidUrl(UrlRejection),

    /// The URL parses but is not a safe delivery target.
    #[error("unsafe webhook URL: {0}")]
    UnsafeUrl(UrlRejection),

    /// A custom header name or value failed validation.
    #[error("invalid header: {name}")]
    InvalidHeader { name: String },

    /// The request body could not be encoded.
    #[error("failed to encode webhook body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<UrlRejection> for DeliveryError {
    fn from(rejection: UrlRejection) -> Self {
        match rejection {
            UrlRejection::Empty | UrlRejection::Malformed => DeliveryError::InvalidUrl(rejection),
            UrlRejection::UnsupportedScheme(_)
            | UrlRejection::MissingHost
            | UrlRejection::EmbeddedCredentials => DeliveryError::UnsafeUrl(rejection),
        }
    }
}

/// Why a single delivery attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u16),

    /// No response: connection refused, DNS failure, timeout and the like.
    #[error("network error: {0}")]
    Network(String),
}

impl AttemptError {
    /// The HTTP status, if the endpoint answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AttemptError::Http(status) => Some(*status),
            AttemptError::Network(_) => None,
        }
    }
}
