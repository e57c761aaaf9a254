//! Field-level rules and the combinators that compose them into pipelines.
//!
//! A rule reads an input record and returns a *contribution*: a fresh record
//! holding only what the rule produced, or the accumulated errors. Rules that
//! rewrite a value in place (`encode_field`, `decode_field`, `map_string`,
//! `prune`, `check_kind`) return the whole input with that change applied.

use crate::core::vocabulary::Vocabulary;
use crate::domain::model::{Record, ValueKind};
use crate::domain::path::FieldPath;
use crate::utils::error::{TransformError, TransformErrors};
use serde_json::Value;
use std::sync::Arc;

pub type RuleResult = std::result::Result<Record, TransformErrors>;

pub trait FieldRule: Send + Sync {
    fn apply(&self, input: &Record) -> RuleResult;
}

impl<F> FieldRule for F
where
    F: Fn(&Record) -> RuleResult + Send + Sync,
{
    fn apply(&self, input: &Record) -> RuleResult {
        self(input)
    }
}

pub type BoxedRule = Box<dyn FieldRule>;
pub type SharedRule = Arc<dyn FieldRule>;

/// Boxes a closure as a rule; used for bespoke rules such as array reshapes.
pub fn rule<F>(f: F) -> BoxedRule
where
    F: Fn(&Record) -> RuleResult + Send + Sync + 'static,
{
    Box::new(f)
}

/// 讓預先組好的規則可以在每次呼叫時再組合
pub fn shared(inner: SharedRule) -> BoxedRule {
    rule(move |input| inner.apply(input))
}

fn require<'a>(path: &FieldPath, input: &'a Record) -> Result<&'a Value, TransformError> {
    path.lookup(input)?.ok_or_else(|| TransformError::missing(path))
}

/// 選填欄位：`null` 與缺欄位同樣視為不存在
fn present<'a>(path: &FieldPath, input: &'a Record) -> Result<Option<&'a Value>, TransformError> {
    Ok(path.lookup(input)?.filter(|value| !value.is_null()))
}

fn require_present<'a>(path: &FieldPath, input: &'a Record) -> Result<&'a Value, TransformError> {
    present(path, input)?.ok_or_else(|| TransformError::missing(path))
}

pub fn identity() -> BoxedRule {
    rule(|input| Ok(input.clone()))
}

pub fn empty() -> BoxedRule {
    rule(|_| Ok(Record::new()))
}

/// 固定值的貢獻
pub fn put(to: &str, value: Value) -> BoxedRule {
    let to = FieldPath::from(to);
    rule(move |_| {
        let mut out = Record::new();
        to.insert(&mut out, value.clone())?;
        Ok(out)
    })
}

pub fn rename(from: &str, to: &str) -> BoxedRule {
    let from = FieldPath::from(from);
    let to = FieldPath::from(to);
    rule(move |input| {
        let value = require(&from, input)?;
        let mut out = Record::new();
        to.insert(&mut out, value.clone())?;
        Ok(out)
    })
}

/// Like `rename`, but an absent or `null` source contributes nothing.
pub fn rename_if_present(from: &str, to: &str) -> BoxedRule {
    let from = FieldPath::from(from);
    let to = FieldPath::from(to);
    rule(move |input| {
        let mut out = Record::new();
        if let Some(value) = present(&from, input)? {
            to.insert(&mut out, value.clone())?;
        }
        Ok(out)
    })
}

pub fn copy_if_present(name: &str) -> BoxedRule {
    rename_if_present(name, name)
}

pub fn encode_field(path: &str, table: Arc<Vocabulary>) -> BoxedRule {
    let path = FieldPath::from(path);
    rule(move |input| {
        let value = require_present(&path, input)?;
        let name = value
            .as_str()
            .ok_or_else(|| TransformError::mismatch(&path, ValueKind::String))?;
        let code = table.encode(name).map_err(|e| e.at(&path))?;

        let mut out = input.clone();
        path.insert(&mut out, Value::from(code))?;
        Ok(out)
    })
}

pub fn decode_field(path: &str, table: Arc<Vocabulary>) -> BoxedRule {
    let path = FieldPath::from(path);
    rule(move |input| {
        let value = require_present(&path, input)?;
        let index = value
            .as_i64()
            .ok_or_else(|| TransformError::mismatch(&path, ValueKind::Integer))?;
        let name = table.decode(index).map_err(|e| e.at(&path))?;

        let mut out = input.clone();
        path.insert(&mut out, Value::String(name.to_string()))?;
        Ok(out)
    })
}

/// 欄位不存在時原樣回傳輸入
pub fn encode_field_if_present(path: &str, table: Arc<Vocabulary>) -> BoxedRule {
    fallback(encode_field(path, table), identity())
}

pub fn decode_field_if_present(path: &str, table: Arc<Vocabulary>) -> BoxedRule {
    fallback(decode_field(path, table), identity())
}

/// Rewrites a required string field in place.
pub fn map_string<F>(path: &str, f: F) -> BoxedRule
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let path = FieldPath::from(path);
    rule(move |input| {
        let value = require(&path, input)?;
        let text = value
            .as_str()
            .ok_or_else(|| TransformError::mismatch(&path, ValueKind::String))?;

        let mut out = input.clone();
        path.insert(&mut out, Value::String(f(text)))?;
        Ok(out)
    })
}

/// Passes the input through, failing only if `path` holds a value of another kind.
pub fn check_kind(path: &str, kind: ValueKind) -> BoxedRule {
    let path = FieldPath::from(path);
    rule(move |input| match present(&path, input)? {
        Some(value) if !kind.matches(value) => Err(TransformError::mismatch(&path, kind).into()),
        _ => Ok(input.clone()),
    })
}

pub fn prune(path: &str) -> BoxedRule {
    let path = FieldPath::from(path);
    rule(move |input| {
        let mut out = input.clone();
        path.remove(&mut out);
        Ok(out)
    })
}

/// 將規則的貢獻包在 `key` 之下
pub fn insert_branch(key: &str, inner: BoxedRule) -> BoxedRule {
    let key = FieldPath::from(key);
    rule(move |input| {
        let branch = inner.apply(input)?;
        let mut out = Record::new();
        key.insert(&mut out, Value::Object(branch))?;
        Ok(out)
    })
}

/// Fuses a date and an optional time into `date` + "T" + `time`.
///
/// Without a date nothing is produced, even when a time is present. A `null`
/// counts as absent. No calendar validation is done.
pub fn fuse_date_time(date: &str, time: &str, to: &str) -> BoxedRule {
    let date = FieldPath::from(date);
    let time = FieldPath::from(time);
    let to = FieldPath::from(to);
    rule(move |input| {
        let mut out = Record::new();
        let Some(date_value) = optional_string(&date, input)? else {
            return Ok(out);
        };
        let fused = match optional_string(&time, input)? {
            Some(time_value) => format!("{}T{}", date_value, time_value),
            None => date_value.to_string(),
        };
        to.insert(&mut out, Value::String(fused))?;
        Ok(out)
    })
}

fn optional_string<'a>(path: &FieldPath, input: &'a Record) -> Result<Option<&'a str>, TransformError> {
    match present(path, input)? {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(TransformError::mismatch(path, ValueKind::String)),
    }
}

/// "and": every rule sees the same input; contributions are deep-merged and
/// errors from all failing rules are collected.
pub fn merge(rules: Vec<BoxedRule>) -> BoxedRule {
    rule(move |input| {
        let mut merged = Record::new();
        let mut errors: Option<TransformErrors> = None;

        for r in &rules {
            let outcome = r.apply(input).and_then(|contribution| {
                merge_into(&mut merged, contribution, "").map_err(TransformErrors::from)
            });
            if let Err(e) = outcome {
                errors = Some(match errors {
                    Some(existing) => existing.merge(e),
                    None => e,
                });
            }
        }

        match errors {
            Some(e) => Err(e),
            None => Ok(merged),
        }
    })
}

/// "and-then": `second` reads what `first` produced.
pub fn sequence(first: BoxedRule, second: BoxedRule) -> BoxedRule {
    rule(move |input| first.apply(input).and_then(|mid| second.apply(&mid)))
}

pub fn chain(rules: Vec<BoxedRule>) -> BoxedRule {
    rule(move |input| {
        let mut current = input.clone();
        for r in &rules {
            current = r.apply(&current)?;
        }
        Ok(current)
    })
}

/// "or-else": `alternative` runs against the original input, and only when
/// `primary` failed because something was absent.
pub fn fallback(primary: BoxedRule, alternative: BoxedRule) -> BoxedRule {
    rule(move |input| match primary.apply(input) {
        Ok(out) => Ok(out),
        Err(errors) if errors.all_absent() => alternative.apply(input),
        Err(errors) => Err(errors),
    })
}

/// Overlays the contribution of `inner` onto the input.
pub fn update(inner: BoxedRule) -> BoxedRule {
    rule(move |input| {
        let contribution = inner.apply(input)?;
        let mut out = input.clone();
        overlay(&mut out, contribution);
        Ok(out)
    })
}

/// In-place rename: the input minus `from`, plus its value at `to`.
pub fn relocate(from: &str, to: &str) -> BoxedRule {
    sequence(update(rename(from, to)), prune(from))
}

/// 來源為 `null` 時只移除來源欄位
pub fn relocate_if_present(from: &str, to: &str) -> BoxedRule {
    let path = FieldPath::from(from);
    let moved = relocate(from, to);
    let dropped = prune(from);
    rule(move |input| match path.lookup(input)? {
        None => Ok(input.clone()),
        Some(Value::Null) => dropped.apply(input),
        Some(_) => moved.apply(input),
    })
}

fn merge_into(target: &mut Record, source: Record, prefix: &str) -> Result<(), TransformError> {
    for (key, value) in source {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match target.get_mut(&key) {
            None => {
                target.insert(key, value);
            }
            Some(Value::Object(existing)) if value.is_object() => {
                if let Value::Object(incoming) = value {
                    merge_into(existing, incoming, &path)?;
                }
            }
            Some(existing) if *existing == value => {}
            Some(_) => return Err(TransformError::ConflictingOutput { path }),
        }
    }
    Ok(())
}

fn overlay(target: &mut Record, source: Record) {
    for (key, value) in source {
        let slot = target.entry(key).or_insert(Value::Null);
        match (slot, value) {
            (Value::Object(existing), Value::Object(incoming)) => overlay(existing, incoming),
            (slot, value) => *slot = value,
        }
    }
}
