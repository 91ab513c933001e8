//! Delivery transport trait.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::SubscriberId;

/// Sends artifacts to a single subscriber. One call is one attempt; the
/// caller never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logs.
    fn name(&self) -> &str;

    async fn send_text(&self, to: SubscriberId, text: &str) -> Result<()>;

    async fn send_file(&self, to: SubscriberId, path: &Path) -> Result<()>;
}
