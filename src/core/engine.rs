use crate::core::inbound::InboundTransformer;
use crate::core::outbound::OutboundTransformer;
use crate::core::rules::RuleResult;
use crate::core::vocabulary::Vocabularies;
use crate::domain::model::{
    from_record, to_record, ApplicationRequest, ApplicationResponse, Record, RegistrationRequest,
    RegistrationResponse,
};
use crate::utils::error::TransformErrors;
use std::sync::Arc;

/// 兩條轉換管線的入口。無共享可變狀態，可跨執行緒同時呼叫
#[derive(Clone)]
pub struct ProtectionBridge {
    outbound: OutboundTransformer,
    inbound: InboundTransformer,
}

impl ProtectionBridge {
    pub fn new(vocabularies: Arc<Vocabularies>) -> Self {
        Self {
            outbound: OutboundTransformer::new(vocabularies.clone()),
            inbound: InboundTransformer::new(vocabularies),
        }
    }

    pub fn transform_outbound_request(&self, nino_without_suffix: &str, application: &Record) -> RuleResult {
        tracing::debug!("🔄 Transforming application for registration ({} fields)", application.len());
        let result = self.outbound.transform(nino_without_suffix, application);
        if let Err(errors) = &result {
            tracing::warn!("❌ Application rejected: {}", errors);
        }
        result
    }

    pub fn transform_inbound_response(&self, nino_suffix: char, response: &Record) -> RuleResult {
        tracing::debug!("🔄 Transforming registration response ({} fields)", response.len());
        let result = self.inbound.transform(nino_suffix, response);
        if let Err(errors) = &result {
            tracing::warn!("❌ Registration response not transformable: {}", errors);
        }
        result
    }

    pub fn outbound_typed(
        &self,
        nino_without_suffix: &str,
        application: &ApplicationRequest,
    ) -> Result<RegistrationRequest, TransformErrors> {
        let record = to_record(application)?;
        let request = self.transform_outbound_request(nino_without_suffix, &record)?;
        Ok(from_record(request, "RegistrationRequest")?)
    }

    pub fn inbound_typed(
        &self,
        nino_suffix: char,
        response: &RegistrationResponse,
    ) -> Result<ApplicationResponse, TransformErrors> {
        let record = to_record(response)?;
        let application = self.transform_inbound_response(nino_suffix, &record)?;
        Ok(from_record(application, "ApplicationResponse")?)
    }
}

impl Default for ProtectionBridge {
    fn default() -> Self {
        Self::new(Arc::new(Vocabularies::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{PensionDebit, RegistrationPensionDebit, ResponseProtection};

    #[test]
    fn test_outbound_typed() {
        let application = ApplicationRequest {
            protection_type: "IP2014".to_string(),
            relevant_amount: Some(1_500_000.0),
            pension_debits: Some(vec![PensionDebit {
                start_date: "2012-01-01".to_string(),
                amount: 500.0,
            }]),
            ..Default::default()
        };

        let request = ProtectionBridge::default()
            .outbound_typed("AB123456", &application)
            .unwrap();

        assert_eq!(request.nino, "AB123456");
        assert_eq!(request.protection.protection_type, 2);
        assert_eq!(request.protection.relevant_amount, Some(1_500_000.0));
        assert_eq!(
            request.pension_debits,
            Some(vec![RegistrationPensionDebit {
                pension_debit_start_date: "2012-01-01".to_string(),
                pension_debit_entered_amount: 500.0,
            }])
        );
    }

    #[test]
    fn test_inbound_typed() {
        let response = RegistrationResponse {
            nino: "AB123456".to_string(),
            pension_scheme_administrator_check_reference: None,
            protection: ResponseProtection {
                id: Some(1),
                protection_type: 5,
                status: Some(2),
                certificate_date: Some("2015-06-01".to_string()),
                certificate_time: Some("14:30:00".to_string()),
                ..Default::default()
            },
        };

        let application = ProtectionBridge::default().inbound_typed('D', &response).unwrap();

        assert_eq!(application.nino, "AB123456D");
        assert_eq!(application.protection_id, Some(1));
        assert_eq!(application.protection_type, "Enhanced");
        assert_eq!(application.status.as_deref(), Some("Dormant"));
        assert_eq!(application.certificate_date.as_deref(), Some("2015-06-01T14:30:00"));
    }

    #[test]
    fn test_bridge_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProtectionBridge>();
    }
}
