use crate::core::engine::ProtectionBridge;
use crate::core::{ConnectorResponse, Record, RegistrationConnector};
use crate::domain::model::ValueKind;
use crate::utils::error::{BridgeError, Result, TransformError, TransformErrors};
use serde_json::Value;

/// 拆出 NINO 本體與字尾。登記系統只接受不含字尾的 NINO
pub fn split_nino(nino: &str) -> Result<(String, char)> {
    let normalized = nino.trim().to_uppercase();
    let mut chars = normalized.chars();
    match (chars.next_back(), chars.as_str()) {
        (Some(suffix), body) if !body.is_empty() => Ok((body.to_string(), suffix)),
        _ => Err(BridgeError::BadRequest(TransformError::missing("nino").into())),
    }
}

/// 申請送件流程：轉換、稽核、呼叫登記系統、轉換回應
pub struct ProtectionService<C: RegistrationConnector> {
    bridge: ProtectionBridge,
    connector: C,
}

impl<C: RegistrationConnector> ProtectionService<C> {
    pub fn new(bridge: ProtectionBridge, connector: C) -> Self {
        Self { bridge, connector }
    }

    pub fn bridge(&self) -> &ProtectionBridge {
        &self.bridge
    }

    pub async fn create(&self, nino: &str, application: &Record) -> Result<Record> {
        let (body, suffix) = split_nino(nino)?;
        let request = self.prepare(&body, application, "create")?;

        tracing::info!("🚀 Submitting new protection for {}", body);
        let response = self.connector.create_protection(&body, &request).await?;
        self.complete(suffix, response)
    }

    pub async fn amend(&self, nino: &str, protection_id: i64, application: &Record) -> Result<Record> {
        let (body, suffix) = split_nino(nino)?;
        let request = self.prepare(&body, application, "amend")?;

        tracing::info!("🚀 Amending protection {} for {}", protection_id, body);
        let response = self
            .connector
            .amend_protection(&body, protection_id, &request)
            .await?;
        self.complete(suffix, response)
    }

    fn prepare(&self, nino: &str, application: &Record, action: &str) -> Result<Record> {
        let request = self
            .bridge
            .transform_outbound_request(nino, application)
            .map_err(BridgeError::BadRequest)?;

        let submitted = Value::Object(application.clone());
        let transformed = Value::Object(request.clone());
        tracing::info!(
            target: "audit",
            action,
            nino,
            application = %submitted,
            registration_request = %transformed,
            "protection application submitted"
        );

        Ok(request)
    }

    fn complete(&self, suffix: char, response: ConnectorResponse) -> Result<Record> {
        if !response.is_success() {
            tracing::warn!("❌ Registration system returned status {}", response.status);
            return Err(BridgeError::DownstreamRejected {
                status: response.status,
                body: response.body.to_string(),
            });
        }

        let response = match response.body {
            Value::Object(record) => record,
            _ => {
                return Err(BridgeError::MalformedResponse(TransformErrors::from(
                    TransformError::mismatch("$", ValueKind::Object),
                )))
            }
        };

        let result = self
            .bridge
            .transform_inbound_response(suffix, &response)
            .map_err(BridgeError::MalformedResponse)?;
        tracing::info!("✅ Registration completed with {} fields", result.len());
        Ok(result)
    }
}
