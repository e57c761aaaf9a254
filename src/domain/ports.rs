use crate::domain::model::Record;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// 登記系統回應的原始內容
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorResponse {
    pub status: u16,
    pub body: Value,
}

impl ConnectorResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport to the registration system. Implementations own timeouts and retries.
#[async_trait]
pub trait RegistrationConnector: Send + Sync {
    async fn create_protection(&self, nino: &str, body: &Record) -> Result<ConnectorResponse>;

    async fn amend_protection(
        &self,
        nino: &str,
        protection_id: i64,
        body: &Record,
    ) -> Result<ConnectorResponse>;
}
