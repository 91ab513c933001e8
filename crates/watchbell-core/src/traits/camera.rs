//! Capture device trait.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Capture one frame and write it to `path`.
    async fn capture(&self, path: &Path) -> Result<()>;
}
