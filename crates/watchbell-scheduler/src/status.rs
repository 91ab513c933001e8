//! Status notifier job: fetch, render, compare with the last delivered
//! status, and fan out on change.
//!
//! Only the last delivered value is remembered, so a value that reverts to
//! an earlier one counts as a change again.

use std::sync::Arc;

use async_trait::async_trait;
use watchbell_core::traits::{Formatter, StatusSource};
use watchbell_core::{Artifact, Result};

use crate::engine::Job;
use crate::notify::{DeliveryReport, Notifier};
use crate::state::SharedState;

#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    Unchanged,
    Changed { text: String, report: DeliveryReport },
}

pub struct StatusJob {
    source: Arc<dyn StatusSource>,
    formatter: Arc<dyn Formatter>,
    notifier: Notifier,
    state: SharedState,
}

impl StatusJob {
    pub fn new(
        source: Arc<dyn StatusSource>,
        formatter: Arc<dyn Formatter>,
        notifier: Notifier,
        state: SharedState,
    ) -> Self {
        Self {
            source,
            formatter,
            notifier,
            state,
        }
    }

    /// One change-detection cycle.
    ///
    /// A fetch error is returned untouched and leaves the stored status as it
    /// was, so the next successful fetch is compared against the last value
    /// actually delivered.
    pub async fn check(&self) -> Result<StatusOutcome> {
        let payload = self.source.fetch().await?;
        let candidate = self.formatter.format(&payload);

        let mut state = self.state.lock().await;
        if let Err(e) = state.status.flush() {
            tracing::warn!("⚠️ Still unable to save last status: {e}");
        }

        if state.status.current() == Some(candidate.as_str()) {
            tracing::info!("No new data available");
            return Ok(StatusOutcome::Unchanged);
        }

        tracing::info!("🆕 New data available: {candidate}");
        if let Err(e) = state.status.record(candidate.clone()) {
            tracing::warn!("⚠️ Failed to save last status: {e}");
        }
        let subscribers = state.subscribers.snapshot();
        let report = self
            .notifier
            .deliver(&Artifact::Text(candidate.clone()), &subscribers)
            .await;

        Ok(StatusOutcome::Changed {
            text: candidate,
            report,
        })
    }
}

#[async_trait]
impl Job for StatusJob {
    fn name(&self) -> &str {
        "status"
    }

    async fn fire(&mut self) -> Result<()> {
        self.check().await.map(|_| ())
    }
}
