//! Status source and formatter traits for the status notifier.

use async_trait::async_trait;

use crate::error::Result;

/// Produces the structured payload the status job watches.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current payload. Failures are transient: the cycle is skipped.
    async fn fetch(&self) -> Result<serde_json::Value>;
}

/// Renders a payload into the canonical string that change detection compares.
///
/// Must be pure: the same payload always renders to the same bytes.
pub trait Formatter: Send + Sync {
    fn format(&self, payload: &serde_json::Value) -> String;
}
