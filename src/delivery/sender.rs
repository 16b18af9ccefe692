//! Webhook delivery with bounded retry.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::{AttemptError, DeliveryError};
use super::retry::RetryPolicy;
use super::transport::{HttpTransport, WebhookRequest};
use crate::config::WebhookConfig;
use crate::security::{check_webhook_url, is_valid_header_name, is_valid_header_value, redact_url};

/// Body of every webhook POST.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    payload: &'a str,
    timestamp: String,
}

impl<'a> Envelope<'a> {
    fn now(payload: &'a str) -> Self {
        Envelope {
            payload,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// The outcome of delivering one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub success: bool,

    /// Status of the last HTTP response received, if any.
    pub status_code: Option<u16>,

    /// The last failure observed. `None` on success.
    pub error: Option<AttemptError>,

    /// Attempts made, including the successful one.
    pub attempt_count: u32,
}

impl DeliveryResult {
    fn delivered(status: u16, attempt_count: u32) -> Self {
        Self {
            success: true,
            status_code: Some(status),
            error: None,
            attempt_count,
        }
    }

    fn failed(status_code: Option<u16>, error: Option<AttemptError>, attempt_count: u32) -> Self {
        Self {
            success: false,
            status_code,
            error,
            attempt_count,
        }
    }
}

/// Delivers payloads to one validated webhook endpoint.
#[derive(Debug)]
pub struct DeliverySender<T> {
    url: Url,
    headers: Vec<(String, String)>,
    policy: RetryPolicy,
    transport: T,
}

impl<T: HttpTransport> DeliverySender<T> {
    /// Builds a sender from configuration.
    ///
    /// # Errors
    ///
    /// Fails before any network activity if the URL is not a safe http(s)
    /// target or any custom header is invalid.
    pub fn new(config: &WebhookConfig, transport: T) -> Result<Self, DeliveryError> {
        let url = check_webhook_url(&config.url)?;

        let mut headers = Vec::with_capacity(config.headers.len());
        for (name, value) in &config.headers {
            if !is_valid_header_name(name) || !is_valid_header_value(value) {
                return Err(DeliveryError::InvalidHeader { name: name.clone() });
            }
            headers.push((name.clone(), value.clone()));
        }

        Ok(Self {
            url,
            headers,
            policy: RetryPolicy::from(&config.retry_strategy),
            transport,
        })
    }

    /// Replaces the retry policy taken from configuration.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Delivers `payload`, retrying per the policy.
    ///
    /// Delivery failures are reported in the returned [`DeliveryResult`],
    /// never as `Err`.
    ///
    /// # Errors
    ///
    /// Only if the request body cannot be encoded.
    pub async fn send(&self, payload: &str) -> Result<DeliveryResult, DeliveryError> {
        self.send_until(payload, &CancellationToken::new()).await
    }

    /// Like [`send`](Self::send), but gives up at the next backoff sleep
    /// once `cancel` fires, returning the failure observed so far.
    #[instrument(skip_all, fields(url = %redact_url(self.url.as_str()), bytes = payload.len()))]
    pub async fn send_until(
        &self,
        payload: &str,
        cancel: &CancellationToken,
    ) -> Result<DeliveryResult, DeliveryError> {
        let body = serde_json::to_string(&Envelope::now(payload))?;
        let request = WebhookRequest {
            url: self.url.clone(),
            headers: self.headers.clone(),
            body,
        };

        let max_attempts = self.policy.max_attempts;
        let mut last_status = None;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.transport.post(request.clone()).await {
                Ok(status) if (200..300).contains(&status) => {
                    debug!(attempt, status, "webhook delivered");
                    return Ok(DeliveryResult::delivered(status, attempt));
                }
                Ok(status) => {
                    warn!(attempt, max_attempts, status, "webhook rejected delivery");
                    last_status = Some(status);
                    last_error = Some(AttemptError::Http(status));
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "webhook delivery attempt failed");
                    last_error = Some(e);
                }
            }

            if attempt < max_attempts {
                let delay = self.policy.delay_after_attempt(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off");
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!(attempt, "delivery cancelled during backoff");
                        return Ok(DeliveryResult::failed(last_status, last_error, attempt));
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        warn!(attempts = max_attempts, "webhook delivery exhausted retries");
        Ok(DeliveryResult::failed(last_status, last_error, max_attempts))
    }
}
