//! HTTP JSON status source and the placeholder template used to render it.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use watchbell_core::config::StatusConfig;
use watchbell_core::traits::{Formatter, StatusSource};
use watchbell_core::{Result, WatchbellError};

/// Fetches a JSON document with a GET request.
pub struct HttpStatusSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpStatusSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &StatusConfig) -> Self {
        Self::new(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> Result<Value> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| WatchbellError::Fetch(format!("GET {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatchbellError::Fetch(format!("GET {} returned {status}", self.url)));
        }

        response
            .json()
            .await
            .map_err(|e| WatchbellError::Fetch(format!("Invalid JSON from {}: {e}", self.url)))
    }
}

/// Renders `{/json/pointer}` placeholders against the payload.
///
/// Strings are inserted without quotes, other values as compact JSON, and
/// missing or null values as `n/a`. Braces not starting with `/` are kept.
pub struct TemplateFormatter {
    template: String,
}

impl TemplateFormatter {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "n/a".into(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl Formatter for TemplateFormatter {
    fn format(&self, payload: &Value) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) if after.starts_with('/') => {
                    out.push_str(&render_value(payload.pointer(&after[..end])));
                    rest = &after[end + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}
