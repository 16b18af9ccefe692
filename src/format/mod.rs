//! Rendering accepted cards into webhook payloads.

pub mod markdown;

pub use markdown::{format_duration, format_summary};

use crate::config::WebhookConfig;
use crate::types::ActivityCard;

/// A payload representation the webhook can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// The cards as a JSON array, camelCase keys.
    Json,
    /// A human-readable summary.
    Markdown,
}

impl PayloadFormat {
    /// The formats enabled in `config`, JSON first.
    pub fn enabled(config: &WebhookConfig) -> Vec<PayloadFormat> {
        let mut formats = Vec::with_capacity(2);
        if config.send_json {
            formats.push(PayloadFormat::Json);
        }
        if config.send_markdown {
            formats.push(PayloadFormat::Markdown);
        }
        formats
    }

    pub fn render(self, cards: &[ActivityCard]) -> serde_json::Result<String> {
        match self {
            PayloadFormat::Json => serde_json::to_string(cards),
            PayloadFormat::Markdown => Ok(format_summary(cards)),
        }
    }
}
