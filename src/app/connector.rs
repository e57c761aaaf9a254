use crate::config::toml_config::RegistrationConfig;
use crate::core::{ConnectorResponse, Record, RegistrationConnector};
use crate::utils::error::Result;
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;
use std::time::Duration;

/// 透過 HTTP 呼叫登記系統
#[derive(Debug, Clone)]
pub struct HttpRegistrationConnector {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
    timeout: Duration,
}

impl HttpRegistrationConnector {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            headers: HashMap::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &RegistrationConfig) -> Self {
        let mut connector = Self::new(config.endpoint.clone());
        if let Some(headers) = &config.headers {
            connector.headers = headers.clone();
        }
        connector.timeout = config.timeout();
        connector
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    fn protections_url(&self, nino: &str) -> String {
        format!("{}/individual/{}/protections", self.endpoint, nino)
    }

    async fn send(&self, request: RequestBuilder, body: &Record) -> Result<ConnectorResponse> {
        let mut request = request.timeout(self.timeout).json(body);

        // 添加自定義標頭
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        tracing::debug!("📡 Registration response status: {}", status);

        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            // 錯誤回應不一定是 JSON，保留原文
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };

        Ok(ConnectorResponse { status, body })
    }
}

#[async_trait::async_trait]
impl RegistrationConnector for HttpRegistrationConnector {
    async fn create_protection(&self, nino: &str, body: &Record) -> Result<ConnectorResponse> {
        let url = self.protections_url(nino);
        tracing::debug!("📡 POST {}", url);
        self.send(self.client.post(&url), body).await
    }

    async fn amend_protection(
        &self,
        nino: &str,
        protection_id: i64,
        body: &Record,
    ) -> Result<ConnectorResponse> {
        let url = format!("{}/{}", self.protections_url(nino), protection_id);
        tracing::debug!("📡 PUT {}", url);
        self.send(self.client.put(&url), body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn body() -> Record {
        json!({"nino": "AB123456", "protection": {"type": 2}})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_posts_to_protections() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/individual/AB123456/protections")
                .header("Environment", "test")
                .json_body(json!({"nino": "AB123456", "protection": {"type": 2}}));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"nino": "AB123456", "protection": {"type": 2, "id": 1}}));
        });

        let connector = HttpRegistrationConnector::new(server.url("/")).with_header("Environment", "test");
        let response = connector.create_protection("AB123456", &body()).await.unwrap();

        mock.assert();
        assert!(response.is_success());
        assert_eq!(response.body["protection"]["id"], json!(1));
    }

    #[tokio::test]
    async fn test_amend_puts_to_protection_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT).path("/individual/AB123456/protections/42");
            then.status(200).json_body(json!({"nino": "AB123456"}));
        });

        let connector = HttpRegistrationConnector::new(server.url(""));
        let response = connector.amend_protection("AB123456", 42, &body()).await.unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_kept_as_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/individual/AB123456/protections");
            then.status(503).body("service unavailable");
        });

        let connector = HttpRegistrationConnector::new(server.url(""));
        let response = connector.create_protection("AB123456", &body()).await.unwrap();

        assert!(!response.is_success());
        assert_eq!(response.body, json!("service unavailable"));
    }
}
