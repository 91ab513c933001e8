//! Fan-out of an artifact to every subscriber.
//! No queues, no retries: one attempt per subscriber, failures are logged and
//! dropped.

use std::sync::Arc;

use watchbell_core::traits::Transport;
use watchbell_core::{Artifact, SubscriberId};

/// Outcome of one fan-out.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub failed: Vec<(SubscriberId, String)>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> usize {
        self.attempted - self.failed.len()
    }
}

#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn Transport>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Deliver `artifact` to each subscriber independently.
    pub async fn deliver(&self, artifact: &Artifact, subscribers: &[SubscriberId]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for &id in subscribers {
            report.attempted += 1;
            let result = match artifact {
                Artifact::Text(text) => self.transport.send_text(id, text).await,
                Artifact::File(path) => self.transport.send_file(id, path).await,
            };
            if let Err(e) = result {
                tracing::warn!(
                    "⚠️ {} delivery to {} failed: {}",
                    self.transport.name(),
                    id,
                    e
                );
                report.failed.push((id, e.to_string()));
            }
        }
        if report.attempted > 0 {
            tracing::info!(
                "📣 Delivered {} to {}/{} subscribers",
                artifact.describe(),
                report.delivered(),
                report.attempted
            );
        }
        report
    }
}
