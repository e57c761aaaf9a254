use crate::utils::error::TransformError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 規則之間傳遞的半結構化記錄
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Object,
    Array,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
        }
    }

    /// Integer 也算 Number
    pub fn matches(self, value: &Value) -> bool {
        match (self, ValueKind::of(value)) {
            (Self::Number, Self::Integer) => true,
            (expected, actual) => expected == actual,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Object => "object",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

/// Element of the application's `pensionDebits` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionDebit {
    pub start_date: String,
    pub amount: f64,
}

/// Outbound input: the application as submitted by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    pub protection_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_a_day_pension_in_payment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_a_day_benefit_crystallisation_events: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncrystallised_rights: Option<f64>,
    #[serde(rename = "nonUKRights", skip_serializing_if = "Option::is_none")]
    pub non_uk_rights: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pension_debits: Option<Vec<PensionDebit>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPensionDebit {
    pub pension_debit_start_date: String,
    pub pension_debit_entered_amount: f64,
}

impl From<&PensionDebit> for RegistrationPensionDebit {
    fn from(debit: &PensionDebit) -> Self {
        Self {
            pension_debit_start_date: debit.start_date.clone(),
            pension_debit_entered_amount: debit.amount,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationProtection {
    #[serde(rename = "type")]
    pub protection_type: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_a_day_pension_in_payment: Option<f64>,
    #[serde(rename = "postADayBCE", skip_serializing_if = "Option::is_none")]
    pub post_a_day_bce: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncrystallised_rights: Option<f64>,
    #[serde(rename = "nonUKRights", skip_serializing_if = "Option::is_none")]
    pub non_uk_rights: Option<f64>,
}

/// Outbound output: the registration request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub nino: String,
    pub protection: RegistrationProtection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pension_debits: Option<Vec<RegistrationPensionDebit>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseProtection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(rename = "type")]
    pub protection_type: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(rename = "notificationID", skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_a_day_pension_in_payment: Option<f64>,
    #[serde(rename = "postADayBCE", skip_serializing_if = "Option::is_none")]
    pub post_a_day_bce: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncrystallised_rights: Option<f64>,
    #[serde(rename = "nonUKRights", skip_serializing_if = "Option::is_none")]
    pub non_uk_rights: Option<f64>,
}

/// Inbound input: the registration system's response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub nino: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pension_scheme_administrator_check_reference: Option<String>,
    pub protection: ResponseProtection,
}

/// Inbound output: the flat record returned to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub nino: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psa_check_reference: Option<String>,
    #[serde(rename = "protectionID", skip_serializing_if = "Option::is_none")]
    pub protection_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    pub protection_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_a_day_pension_in_payment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_a_day_benefit_crystallisation_events: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncrystallised_rights: Option<f64>,
    #[serde(rename = "nonUKRights", skip_serializing_if = "Option::is_none")]
    pub non_uk_rights: Option<f64>,
}

/// 型別結構轉為記錄
pub fn to_record<T: Serialize>(shape: &T) -> Result<Record, TransformError> {
    match serde_json::to_value(shape) {
        Ok(Value::Object(record)) => Ok(record),
        _ => Err(TransformError::mismatch("$", ValueKind::Object)),
    }
}

/// 記錄轉回型別結構；不符合結構時以 schema 名稱作為路徑
pub fn from_record<T: DeserializeOwned>(record: Record, schema: &str) -> Result<T, TransformError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| {
        tracing::debug!("Record does not fit {}: {}", schema, e);
        TransformError::mismatch(schema, ValueKind::Object)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_kind_number_accepts_integers() {
        assert!(ValueKind::Number.matches(&json!(500)));
        assert!(ValueKind::Number.matches(&json!(12.5)));
        assert!(!ValueKind::Integer.matches(&json!(12.5)));
        assert!(!ValueKind::Number.matches(&json!("500")));
    }

    #[test]
    fn test_application_request_skips_absent_fields() {
        let request = ApplicationRequest {
            protection_type: "IP2014".to_string(),
            non_uk_rights: Some(1000.0),
            ..Default::default()
        };

        let record = to_record(&request).unwrap();
        assert_eq!(
            Value::Object(record),
            json!({"protectionType": "IP2014", "nonUKRights": 1000.0})
        );
    }

    #[test]
    fn test_from_record_reports_schema_on_mismatch() {
        let record = json!({"nino": "AB123456"}).as_object().unwrap().clone();
        let result: Result<RegistrationResponse, _> = from_record(record, "RegistrationResponse");

        assert_eq!(
            result.unwrap_err(),
            TransformError::mismatch("RegistrationResponse", ValueKind::Object)
        );
    }
}
