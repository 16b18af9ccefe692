//! The HTTP seam between the sender and the network.
//!
//! [`DeliverySender`](super::DeliverySender) owns retry and bookkeeping; a
//! transport performs exactly one POST and reports the status it got back.
//! Tests substitute a scripted transport, production uses
//! [`ReqwestTransport`].

use std::future::Future;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::error::{AttemptError, DeliveryError};

/// One outbound webhook POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub url: Url,

    /// Custom headers, already validated. Applied after `Content-Type`, so
    /// a custom `Content-Type` replaces the default.
    pub headers: Vec<(String, String)>,

    /// JSON body.
    pub body: String,
}

/// Performs single webhook POSTs.
///
/// # Example (scripted transport for tests)
///
/// ```ignore
/// struct AlwaysDown;
///
/// impl HttpTransport for AlwaysDown {
///     async fn post(&self, _request: WebhookRequest) -> Result<u16, AttemptError> {
///         Err(AttemptError::Network("connection refused".into()))
///     }
/// }
/// ```
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns the response status.
    ///
    /// Any status, including non-2xx, is `Ok`. `Err` means no response
    /// was received.
    fn post(
        &self,
        request: WebhookRequest,
    ) -> impl Future<Output = Result<u16, AttemptError>> + Send;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dayflow-relay/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: WebhookRequest) -> Result<u16, AttemptError> {
        let headers = header_map(&request.headers)?;
        let response = self
            .client
            .post(request.url)
            .headers(headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AttemptError::Network(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    AttemptError::Network(format!("connection failed: {e}"))
                } else {
                    AttemptError::Network(format!("request failed: {e}"))
                }
            })?;
        Ok(response.status().as_u16())
    }
}

fn header_map(custom: &[(String, String)]) -> Result<HeaderMap, AttemptError> {
    let mut headers = HeaderMap::with_capacity(custom.len() + 1);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in custom {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AttemptError::Network(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AttemptError::Network(format!("invalid value for header {name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
