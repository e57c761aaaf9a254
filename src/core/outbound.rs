use crate::core::rules::{
    self, check_kind, copy_if_present, encode_field, insert_branch, merge, put, rename,
    rename_if_present, sequence, BoxedRule, RuleResult, SharedRule,
};
use crate::core::vocabulary::Vocabularies;
use crate::domain::model::{Record, ValueKind};
use crate::utils::error::{TransformError, TransformErrors};
use serde_json::{json, Value};
use std::sync::Arc;

const PENSION_DEBITS: &str = "pensionDebits";

/// 原樣傳遞的金額欄位 (登記系統端的名稱)
const AMOUNT_FIELDS: [&str; 5] = [
    "postADayBCE",
    "preADayPensionInPayment",
    "uncrystallisedRights",
    "nonUKRights",
    "relevantAmount",
];

/// Application record -> registration request.
#[derive(Clone)]
pub struct OutboundTransformer {
    body: SharedRule,
}

impl OutboundTransformer {
    pub fn new(vocabularies: Arc<Vocabularies>) -> Self {
        let body = merge(vec![
            reshape_pension_debits(),
            insert_branch("protection", protection_branch(&vocabularies)),
        ]);
        Self { body: Arc::from(body) }
    }

    pub fn transform(&self, nino_without_suffix: &str, application: &Record) -> RuleResult {
        merge(vec![
            put("nino", Value::String(nino_without_suffix.to_string())),
            rules::shared(self.body.clone()),
        ])
        .apply(application)
    }
}

fn protection_branch(vocabularies: &Vocabularies) -> BoxedRule {
    let fields = merge(vec![
        sequence(
            encode_field("protectionType", vocabularies.protection_types.clone()),
            rename("protectionType", "type"),
        ),
        rename_if_present("postADayBenefitCrystallisationEvents", "postADayBCE"),
        copy_if_present("preADayPensionInPayment"),
        copy_if_present("uncrystallisedRights"),
        copy_if_present("nonUKRights"),
        copy_if_present("relevantAmount"),
    ]);
    let amounts = AMOUNT_FIELDS
        .iter()
        .map(|field| check_kind(field, ValueKind::Number))
        .collect();

    sequence(fields, merge(amounts))
}

/// `pensionDebits: [{startDate, amount}]` -> `[{pensionDebitStartDate, pensionDebitEnteredAmount}]`.
///
/// The array is optional, but a present array with a bad element fails the
/// whole request rather than being dropped.
fn reshape_pension_debits() -> BoxedRule {
    rules::rule(|input| {
        let items = match input.get(PENSION_DEBITS) {
            None | Some(Value::Null) => return Ok(Record::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(TransformError::mismatch(PENSION_DEBITS, ValueKind::Array).into()),
        };

        let mut debits = Vec::with_capacity(items.len());
        let mut errors: Option<TransformErrors> = None;
        for (index, item) in items.iter().enumerate() {
            match reshape_debit(item) {
                Some(debit) => debits.push(debit),
                None => {
                    tracing::debug!("Malformed pension debit at index {}: {}", index, item);
                    let error = TransformError::MalformedArrayElement {
                        path: PENSION_DEBITS.to_string(),
                        index,
                    };
                    errors = Some(match errors {
                        Some(existing) => existing.merge(error.into()),
                        None => error.into(),
                    });
                }
            }
        }
        if let Some(errors) = errors {
            return Err(errors);
        }

        let mut out = Record::new();
        out.insert(PENSION_DEBITS.to_string(), Value::Array(debits));
        Ok(out)
    })
}

fn reshape_debit(item: &Value) -> Option<Value> {
    let debit = item.as_object()?;
    let start_date = debit.get("startDate").filter(|v| v.is_string())?;
    let amount = debit.get("amount").filter(|v| v.is_number())?;
    Some(json!({
        "pensionDebitStartDate": start_date,
        "pensionDebitEnteredAmount": amount,
    }))
}
