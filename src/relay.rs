//! Send-or-enqueue delivery and the periodic flush loop.
//!
//! The relay is the only place the sender and the queue meet:
//!
//! - [`Relay::deliver_or_enqueue`] tries the webhook once (with retries)
//!   and parks the payload in the queue if that fails.
//! - [`Relay::flush`] claims everything queued and resends it. Payloads
//!   that still fail go back into the queue for the next cycle.
//! - [`Relay::run`] calls `flush` on a timer until shutdown.
//!
//! Filesystem work runs on tokio's blocking pool.

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::delivery::{DeliveryError, DeliverySender, HttpTransport};
use crate::format::PayloadFormat;
use crate::queue::{self, PersistentQueue, QueueError};
use crate::types::ActivityCard;
use crate::validation::{CoverageError, Verdict, validate_replacement};

/// Errors that stop a relay operation.
///
/// A failed delivery is not one of them; it ends in the queue.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("validation error: {0}")]
    Coverage(#[from] CoverageError),

    #[error("background task failed: {0}")]
    Background(#[from] JoinError),
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// What happened to one payload handed to the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Queued,
}

/// What happened to a batch of replacement cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publication {
    /// The cards failed validation; nothing was sent.
    Rejected(String),
    /// The cards were accepted; one outcome per enabled payload format.
    Published(Vec<DeliveryOutcome>),
}

/// Tally of one flush cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub requeued: usize,
    /// Payloads that failed delivery and could not be written back.
    pub lost: usize,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        *self == FlushReport::default()
    }
}

/// Couples a [`DeliverySender`] with a [`PersistentQueue`].
#[derive(Debug)]
pub struct Relay<T> {
    sender: DeliverySender<T>,
    queue: PersistentQueue,
    formats: Vec<PayloadFormat>,
    flush_interval: Duration,
}

impl<T: HttpTransport> Relay<T> {
    /// Creates a relay sending JSON payloads and flushing every five minutes.
    pub fn new(sender: DeliverySender<T>, queue: PersistentQueue) -> Self {
        Self {
            sender,
            queue,
            formats: vec![PayloadFormat::Json],
            flush_interval: Duration::from_secs(300),
        }
    }

    /// Takes payload formats and flush interval from `config`.
    pub fn configured(mut self, config: &Config) -> Self {
        self.formats = PayloadFormat::enabled(&config.webhook);
        self.flush_interval = config.queue.flush_interval();
        self
    }

    pub fn with_formats(mut self, formats: Vec<PayloadFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    pub fn sender(&self) -> &DeliverySender<T> {
        &self.sender
    }

    pub fn queue(&self) -> &PersistentQueue {
        &self.queue
    }

    /// Sends `payload`; if delivery fails, enqueues it durably instead.
    ///
    /// # Errors
    ///
    /// Only if the payload could neither be delivered nor enqueued.
    pub async fn deliver_or_enqueue(&self, payload: String) -> Result<DeliveryOutcome> {
        let result = self.sender.send(&payload).await?;
        if result.success {
            return Ok(DeliveryOutcome::Delivered {
                attempts: result.attempt_count,
            });
        }

        warn!(
            attempts = result.attempt_count,
            status = ?result.status_code,
            "delivery failed, queueing payload for the next flush"
        );
        self.on_queue(move |queue| queue.enqueue(&payload)).await?;
        Ok(DeliveryOutcome::Queued)
    }

    /// Renders `cards` in each enabled format and delivers every payload.
    pub async fn publish(&self, cards: &[ActivityCard]) -> Result<Vec<DeliveryOutcome>> {
        let mut outcomes = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            let payload = format.render(cards)?;
            outcomes.push(self.deliver_or_enqueue(payload).await?);
        }
        Ok(outcomes)
    }

    /// Validates `new` as a replacement for `existing` and publishes it if
    /// accepted.
    pub async fn publish_replacement(
        &self,
        existing: &[ActivityCard],
        new: &[ActivityCard],
    ) -> Result<Publication> {
        match validate_replacement(existing, new)? {
            Verdict::Accepted => Ok(Publication::Published(self.publish(new).await?)),
            Verdict::Rejected(reason) => {
                info!(cards = new.len(), "replacement cards rejected");
                Ok(Publication::Rejected(reason))
            }
        }
    }

    /// Claims every queued payload and tries to deliver it.
    ///
    /// Every claimed payload that is not delivered is re-enqueued, whatever
    /// the reason. Once `shutdown` fires the remaining payloads are
    /// re-enqueued without another attempt.
    #[instrument(skip_all)]
    pub async fn flush(&self, shutdown: &CancellationToken) -> Result<FlushReport> {
        let payloads = self.on_queue(PersistentQueue::dequeue_all).await?;
        let mut report = FlushReport::default();
        if payloads.is_empty() {
            return Ok(report);
        }
        debug!(count = payloads.len(), "flushing queued payloads");

        for payload in payloads {
            if !shutdown.is_cancelled() {
                match self.sender.send_until(&payload, shutdown).await {
                    Ok(result) if result.success => {
                        report.delivered += 1;
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "could not attempt delivery of queued payload");
                    }
                }
            }

            match self.on_queue(move |queue| queue.enqueue(&payload)).await {
                Ok(_) => report.requeued += 1,
                Err(e) => {
                    error!(error = %e, "failed to re-enqueue undelivered payload, it is lost");
                    report.lost += 1;
                }
            }
        }

        info!(
            delivered = report.delivered,
            requeued = report.requeued,
            lost = report.lost,
            "flush complete"
        );
        Ok(report)
    }

    /// Flushes every `flush_interval` until `shutdown` is cancelled.
    #[instrument(skip_all, fields(interval_secs = self.flush_interval.as_secs()))]
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("flush loop started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown signal received, stopping flush loop");
                    break;
                }
                _ = tokio::time::sleep(self.flush_interval) => {
                    if let Err(e) = self.flush(&shutdown).await {
                        error!(error = %e, "flush failed");
                    }
                }
            }
        }
    }

    async fn on_queue<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&PersistentQueue) -> queue::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let queue = self.queue.clone();
        Ok(tokio::task::spawn_blocking(move || op(&queue)).await??)
    }
}
