//! Shared test utilities and arbitrary generators for property-based testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use proptest::prelude::*;

use crate::delivery::{AttemptError, HttpTransport, WebhookRequest};
use crate::validation::TimeInterval;

/// A transport that replays a fixed script of responses and records every
/// request it sees. Once the script runs out it answers 200.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<u16, AttemptError>>>,
    requests: Mutex<Vec<WebhookRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<u16, AttemptError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<WebhookRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn post(&self, request: WebhookRequest) -> Result<u16, AttemptError> {
        self.requests.lock().unwrap().push(request);
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(200))
    }
}

pub fn arb_interval() -> impl Strategy<Value = TimeInterval> {
    (0.0f64..2000.0, 0.0f64..180.0).prop_map(|(start, len)| TimeInterval::new(start, start + len))
}

pub fn arb_intervals() -> impl Strategy<Value = Vec<TimeInterval>> {
    prop::collection::vec(arb_interval(), 0..30)
}
