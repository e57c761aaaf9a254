use crate::core::rules::{
    self, chain, decode_field, decode_field_if_present, fuse_date_time, map_string, merge, prune,
    relocate_if_present, rename, rename_if_present, sequence, BoxedRule, RuleResult, SharedRule,
};
use crate::core::vocabulary::Vocabularies;
use crate::domain::model::Record;
use std::sync::Arc;

const PROTECTION: &str = "protection";

/// 直接搬到頂層、名稱不變的選填欄位
const PLAIN_FIELDS: [&str; 6] = [
    "version",
    "relevantAmount",
    "preADayPensionInPayment",
    "uncrystallisedRights",
    "nonUKRights",
    "protectionReference",
];

/// Registration response -> flat application response.
#[derive(Clone)]
pub struct InboundTransformer {
    body: SharedRule,
}

impl InboundTransformer {
    pub fn new(vocabularies: Arc<Vocabularies>) -> Self {
        let body = chain(vec![
            relocate_if_present("pensionSchemeAdministratorCheckReference", "psaCheckReference"),
            rules::update(lift_protection(&vocabularies)),
            prune(PROTECTION),
        ]);
        Self { body: Arc::from(body) }
    }

    pub fn transform(&self, nino_suffix: char, response: &Record) -> RuleResult {
        chain(vec![
            map_string("nino", move |nino| format!("{}{}", nino, nino_suffix)),
            rules::shared(self.body.clone()),
        ])
        .apply(response)
    }
}

fn nested(field: &str) -> String {
    format!("{}.{}", PROTECTION, field)
}

/// Copies the nested `protection` fields to the top level.
fn lift_protection(vocabularies: &Vocabularies) -> BoxedRule {
    let mut fields = vec![
        rename_if_present(&nested("id"), "protectionID"),
        sequence(
            decode_field(&nested("type"), vocabularies.protection_types.clone()),
            rename(&nested("type"), "protectionType"),
        ),
        sequence(
            decode_field_if_present(&nested("status"), vocabularies.protection_statuses.clone()),
            rename_if_present(&nested("status"), "status"),
        ),
        rename_if_present(&nested("postADayBCE"), "postADayBenefitCrystallisationEvents"),
        rename_if_present(&nested("notificationID"), "notificationId"),
        fuse_date_time(
            &nested("certificateDate"),
            &nested("certificateTime"),
            "certificateDate",
        ),
    ];
    fields.extend(
        PLAIN_FIELDS
            .iter()
            .map(|field| rename_if_present(&nested(field), field)),
    );

    merge(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ValueKind;
    use crate::utils::error::TransformError;
    use serde_json::{json, Value};

    fn transformer() -> InboundTransformer {
        InboundTransformer::new(Arc::new(Vocabularies::default()))
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_nino_suffix_is_reappended() {
        let out = transformer()
            .transform('A', &record(json!({"nino": "AB123456", "protection": {"type": 1}})))
            .unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"nino": "AB123456A", "protectionType": "FP2016"})
        );
    }

    #[test]
    fn test_full_response() {
        let response = record(json!({
            "nino": "AB123456",
            "pensionSchemeAdministratorCheckReference": "PSA123456789",
            "protection": {
                "id": 12345,
                "version": 2,
                "type": 3,
                "status": 1,
                "notificationID": 7,
                "protectionReference": "IP161234567890C",
                "certificateDate": "2016-04-17",
                "certificateTime": "15:14:00",
                "relevantAmount": 1250000,
                "preADayPensionInPayment": 100,
                "postADayBCE": 200,
                "uncrystallisedRights": 300,
                "nonUKRights": 400
            }
        }));

        let out = transformer().transform('C', &response).unwrap();

        assert_eq!(
            Value::Object(out),
            json!({
                "nino": "AB123456C",
                "psaCheckReference": "PSA123456789",
                "protectionID": 12345,
                "version": 2,
                "protectionType": "IP2016",
                "status": "Open",
                "notificationId": 7,
                "protectionReference": "IP161234567890C",
                "certificateDate": "2016-04-17T15:14:00",
                "relevantAmount": 1250000,
                "preADayPensionInPayment": 100,
                "postADayBenefitCrystallisationEvents": 200,
                "uncrystallisedRights": 300,
                "nonUKRights": 400
            })
        );
    }

    #[test]
    fn test_certificate_date_without_time() {
        let response = record(json!({
            "nino": "AB123456",
            "protection": {"type": 2, "certificateDate": "2015-06-01"}
        }));
        let out = transformer().transform('A', &response).unwrap();
        assert_eq!(out.get("certificateDate"), Some(&json!("2015-06-01")));
    }

    #[test]
    fn test_missing_nested_type() {
        let response = record(json!({"nino": "AB123456", "protection": {"status": 1}}));
        let errors = transformer().transform('A', &response).unwrap_err();
        assert_eq!(errors.into_vec(), vec![TransformError::missing("protection.type")]);
    }

    #[test]
    fn test_status_out_of_range() {
        let response = record(json!({"nino": "AB123456", "protection": {"type": 2, "status": 7}}));
        let errors = transformer().transform('A', &response).unwrap_err();
        assert_eq!(
            errors.first(),
            &TransformError::IndexOutOfRange {
                path: "protection.status".to_string(),
                index: 7
            }
        );
    }

    #[test]
    fn test_unknown_type_code_names_nested_field() {
        let response = record(json!({"nino": "AB123456", "protection": {"type": 42}}));
        let errors = transformer().transform('A', &response).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![TransformError::IndexOutOfRange {
                path: "protection.type".to_string(),
                index: 42
            }]
        );
    }

    #[test]
    fn test_null_optional_fields_are_dropped() {
        let response = record(json!({
            "nino": "AB123456",
            "pensionSchemeAdministratorCheckReference": null,
            "protection": {
                "id": null,
                "type": 2,
                "status": null,
                "certificateDate": null,
                "relevantAmount": null
            }
        }));
        let out = transformer().transform('A', &response).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"nino": "AB123456A", "protectionType": "IP2014"})
        );
    }

    #[test]
    fn test_nino_must_be_string() {
        let response = record(json!({"nino": 123456, "protection": {"type": 2}}));
        let errors = transformer().transform('A', &response).unwrap_err();
        assert_eq!(errors.first(), &TransformError::mismatch("nino", ValueKind::String));
    }
}
