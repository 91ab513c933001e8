//! External device toggle bracketing a capture (e.g. a light).

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Actuator: Send + Sync {
    fn name(&self) -> &str;

    async fn turn_on(&self) -> Result<()>;

    async fn turn_off(&self) -> Result<()>;
}
