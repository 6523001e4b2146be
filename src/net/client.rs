//! HTTP client for endpoint scenarios

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::browser::ScenarioError;

/// Transient capture of one HTTP exchange. Consumed by the assertions that
/// reference it, never persisted.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    /// Status code
    pub status: u16,
    /// Response headers, lowercased names
    pub headers: BTreeMap<String, String>,
    /// Raw body text
    pub body: String,
    /// Body parsed as JSON, when it is JSON
    pub json: Option<serde_json::Value>,
}

impl CapturedResponse {
    /// Look up a JSON value by RFC 6901 pointer.
    pub fn json_pointer(&self, pointer: &str) -> Option<&serde_json::Value> {
        self.json.as_ref().and_then(|v| v.pointer(pointer))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }
}

/// HTTP client bound to the application's base URL.
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ScenarioError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScenarioError::Config(format!("invalid base URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScenarioError::Http(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Resolve a path (or absolute URL) against the base URL.
    pub fn resolve(&self, path: &str) -> Result<Url, ScenarioError> {
        self.base_url
            .join(path)
            .map_err(|e| ScenarioError::Config(format!("invalid path '{}': {}", path, e)))
    }

    /// GET a path and capture the exchange.
    pub async fn get(&self, path: &str) -> Result<CapturedResponse, ScenarioError> {
        let url = self.resolve(path)?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScenarioError::Http(e.to_string()))?;
        Self::capture(response).await
    }

    /// POST a JSON body to a path and capture the exchange.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<CapturedResponse, ScenarioError> {
        let url = self.resolve(path)?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ScenarioError::Http(e.to_string()))?;
        Self::capture(response).await
    }

    async fn capture(response: reqwest::Response) -> Result<CapturedResponse, ScenarioError> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ScenarioError::Http(e.to_string()))?;
        let json = serde_json::from_str(&body).ok();

        Ok(CapturedResponse {
            status,
            headers,
            body,
            json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(body: &str) -> CapturedResponse {
        CapturedResponse {
            status: 200,
            headers: BTreeMap::from([(
                "x-content-type-options".to_string(),
                "nosniff".to_string(),
            )]),
            body: body.to_string(),
            json: serde_json::from_str(body).ok(),
        }
    }

    #[test]
    fn json_pointer_reads_nested_fields() {
        let response = captured(r#"{"uptime": 12.5, "checks": {"db": "ok"}}"#);
        assert_eq!(
            response.json_pointer("/uptime").and_then(|v| v.as_f64()),
            Some(12.5)
        );
        assert_eq!(
            response.json_pointer("/checks/db").and_then(|v| v.as_str()),
            Some("ok")
        );
        assert!(response.json_pointer("/missing").is_none());
    }

    #[test]
    fn non_json_body_yields_no_json() {
        let response = captured("<!doctype html><html></html>");
        assert!(response.json.is_none());
        assert_eq!(response.body, "<!doctype html><html></html>");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = captured("{}");
        assert_eq!(response.header("X-Content-Type-Options"), Some("nosniff"));
        assert!(response.header("content-security-policy").is_none());
    }

    #[test]
    fn resolve_joins_paths_onto_base() {
        let client = ApiClient::new("http://localhost:3000", 5).unwrap();
        assert_eq!(
            client.resolve("/api/projects?tech=Next.js").unwrap().as_str(),
            "http://localhost:3000/api/projects?tech=Next.js"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(ApiClient::new("not a url", 5).is_err());
    }
}
