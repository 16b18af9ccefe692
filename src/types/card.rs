//! Activity card data model.
//!
//! Cards arrive from the external analysis process as JSON with camelCase
//! keys. The relay never interprets categories or summaries; it only reads
//! the timestamps and hands the rest through to formatting.

use serde::{Deserialize, Serialize};

use super::timestamp::elapsed_minutes;

/// A timestamped description of user activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCard {
    pub start_time: String,
    pub end_time: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub detailed_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distractions: Option<Vec<Distraction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_sites: Option<AppSites>,
}

impl ActivityCard {
    /// Creates a card with the required fields; the rest start empty.
    pub fn new(
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        category: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        ActivityCard {
            start_time: start_time.into(),
            end_time: end_time.into(),
            category: category.into(),
            subcategory: String::new(),
            title: title.into(),
            summary: String::new(),
            detailed_summary: String::new(),
            distractions: None,
            app_sites: None,
        }
    }

    /// Sets the one-line summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Elapsed minutes between start and end, or `None` if either endpoint
    /// is unparseable or the two use different encodings.
    pub fn duration_minutes(&self) -> Option<f64> {
        elapsed_minutes(&self.start_time, &self.end_time)
    }
}

/// A short interruption inside a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distraction {
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

/// Sites the user spent the card on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSites {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}
