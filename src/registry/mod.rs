//! Agent Registry Client: a thin HTTP passthrough to the external agent
//! registry service. The registry's JSON structure is forwarded
//! unmodified — this gateway is a transport, not a re-mapper (§4.3).

use std::time::Duration;

use serde_json::Value;

const REGISTRY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("agent registry request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("agent registry returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// HTTP client to the agent registry. Operations consumed by this core:
/// `register`, `discover`, `fetch_card`.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REGISTRY_TIMEOUT_SECS))
            .build()
            .expect("reqwest client builder with only a timeout never fails");

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<Value, RegistryError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// `POST /agents/register { agentCard: {...} }` -> `{ agentId }`.
    pub async fn register(&self, agent_card: Value) -> Result<Value, RegistryError> {
        let response = self
            .http
            .post(format!("{}/agents/register", self.base_url))
            .json(&serde_json::json!({ "agentCard": agent_card }))
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// `GET /agents/discover?capability&keyword&limit` -> opaque JSON.
    pub async fn discover(
        &self,
        capability: Option<&str>,
        keyword: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Value, RegistryError> {
        let mut query = Vec::new();
        if let Some(c) = capability {
            query.push(("capability", c.to_string()));
        }
        if let Some(k) = keyword {
            query.push(("keyword", k.to_string()));
        }
        if let Some(l) = limit {
            query.push(("limit", l.to_string()));
        }

        let response = self
            .http
            .get(format!("{}/agents/discover", self.base_url))
            .query(&query)
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// `GET /agents/{id}` -> agent card, with `url` rewritten to
    /// `{proxy_base}/{id}` so clients reach the agent through this
    /// gateway rather than the registry's internal address (§6.6).
    pub async fn fetch_card(&self, agent_id: &str, proxy_base: &str) -> Result<Value, RegistryError> {
        let response = self
            .http
            .get(format!("{}/agents/{agent_id}", self.base_url))
            .send()
            .await?;
        let mut card = Self::check_status(response).await?;

        if let Some(obj) = card.as_object_mut() {
            obj.insert("url".to_string(), Value::String(format!("{proxy_base}/{agent_id}")));
        }

        Ok(card)
    }

    /// Best-effort reachability check for `GET /health` — any response at
    /// all (including a non-2xx one) counts as reachable.
    pub async fn ping(&self) -> bool {
        self.http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_builds_without_panicking() {
        let _client = RegistryClient::new("http://localhost:9000");
    }
}
