//! Home Assistant light driven through the REST services API.

use async_trait::async_trait;
use watchbell_core::config::ActuationConfig;
use watchbell_core::traits::Actuator;
use watchbell_core::{Result, WatchbellError};

/// Calls `POST {base}/api/services/{domain}/turn_on|turn_off` for one entity.
pub struct HomeAssistantLight {
    client: reqwest::Client,
    base_url: String,
    token: String,
    entity_id: String,
    domain: String,
}

impl HomeAssistantLight {
    pub fn new(config: &ActuationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            entity_id: config.entity_id.clone(),
            domain: config.domain.clone(),
        }
    }

    fn service_url(&self, service: &str) -> String {
        format!("{}/api/services/{}/{}", self.base_url, self.domain, service)
    }

    async fn call(&self, service: &str) -> Result<()> {
        let body = serde_json::json!({ "entity_id": self.entity_id });

        let response = self
            .client
            .post(self.service_url(service))
            .bearer_auth(&self.token)
            .json(&body)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| WatchbellError::Actuation(format!("{service} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WatchbellError::Actuation(format!(
                "{} {service} returned {status}: {text}",
                self.entity_id
            )));
        }

        tracing::debug!("💡 {} {service}", self.entity_id);
        Ok(())
    }
}

#[async_trait]
impl Actuator for HomeAssistantLight {
    fn name(&self) -> &str {
        &self.entity_id
    }

    async fn turn_on(&self) -> Result<()> {
        self.call("turn_on").await
    }

    async fn turn_off(&self) -> Result<()> {
        self.call("turn_off").await
    }
}
