use crate::domain::model::{Record, ValueKind};
use crate::utils::error::TransformError;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// 以 `.` 和 `[n]` 定位記錄中的欄位，例如 `protection.type`、`pensionDebits[0].amount`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 取得路徑上的值。中間節點存在但型別不對時回傳 TypeMismatch，不當作缺欄位
    pub fn lookup<'a>(&self, record: &'a Record) -> Result<Option<&'a Value>, TransformError> {
        let Some((first, rest)) = self.segments.split_first() else {
            return Ok(None);
        };
        let Segment::Key(key) = first else {
            return Err(TransformError::mismatch(self, ValueKind::Array));
        };
        let mut current = match record.get(key) {
            Some(value) => value,
            None => return Ok(None),
        };

        for segment in rest {
            let next = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key),
                (Segment::Index(index), Value::Array(items)) => items.get(*index),
                (Segment::Key(_), _) => return Err(TransformError::mismatch(self, ValueKind::Object)),
                (Segment::Index(_), _) => return Err(TransformError::mismatch(self, ValueKind::Array)),
            };
            match next {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }

        Ok(Some(current))
    }

    pub fn get<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        self.lookup(record).ok().flatten()
    }

    /// 寫入值，缺少的中間物件會自動建立；陣列索引必須已存在
    pub fn insert(&self, record: &mut Record, value: Value) -> Result<(), TransformError> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(TransformError::missing(self));
        };

        let mut slot = SlotMut::Record(record);
        for segment in parents {
            slot = slot.descend(segment, self)?;
        }

        match (last, slot) {
            (Segment::Key(key), SlotMut::Record(map)) => {
                map.insert(key.clone(), value);
            }
            (Segment::Key(key), SlotMut::Value(Value::Object(map))) => {
                map.insert(key.clone(), value);
            }
            (Segment::Index(index), SlotMut::Value(Value::Array(items))) => match items.get_mut(*index) {
                Some(item) => *item = value,
                None => return Err(TransformError::missing(self)),
            },
            (Segment::Key(_), _) => return Err(TransformError::mismatch(self, ValueKind::Object)),
            (Segment::Index(_), _) => return Err(TransformError::mismatch(self, ValueKind::Array)),
        }
        Ok(())
    }

    /// 移除並回傳路徑上的值；路徑不存在時不做事
    pub fn remove(&self, record: &mut Record) -> Option<Value> {
        let (last, parents) = self.segments.split_last()?;

        let mut slot = SlotMut::Record(record);
        for segment in parents {
            slot = slot.walk(segment)?;
        }

        match (last, slot) {
            (Segment::Key(key), SlotMut::Record(map)) => map.shift_remove(key),
            (Segment::Key(key), SlotMut::Value(Value::Object(map))) => map.shift_remove(key),
            (Segment::Index(index), SlotMut::Value(Value::Array(items))) if *index < items.len() => {
                Some(items.remove(*index))
            }
            _ => None,
        }
    }
}

enum SlotMut<'a> {
    Record(&'a mut Record),
    Value(&'a mut Value),
}

impl<'a> SlotMut<'a> {
    fn map(self) -> Option<&'a mut Record> {
        match self {
            SlotMut::Record(map) => Some(map),
            SlotMut::Value(Value::Object(map)) => Some(map),
            SlotMut::Value(_) => None,
        }
    }

    /// 只走既有節點
    fn walk(self, segment: &Segment) -> Option<SlotMut<'a>> {
        match (segment, self) {
            (Segment::Index(index), SlotMut::Value(Value::Array(items))) => {
                items.get_mut(*index).map(SlotMut::Value)
            }
            (Segment::Key(key), slot) => slot.map()?.get_mut(key).map(SlotMut::Value),
            _ => None,
        }
    }

    /// 走訪並建立缺少的物件
    fn descend(self, segment: &Segment, path: &FieldPath) -> Result<SlotMut<'a>, TransformError> {
        match segment {
            Segment::Key(key) => {
                let map = self
                    .map()
                    .ok_or_else(|| TransformError::mismatch(path, ValueKind::Object))?;
                let child = map
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Record::new()));
                if matches!(child, Value::Object(_) | Value::Array(_)) {
                    Ok(SlotMut::Value(child))
                } else {
                    Err(TransformError::mismatch(path, ValueKind::Object))
                }
            }
            Segment::Index(index) => match self {
                SlotMut::Value(Value::Array(items)) => items
                    .get_mut(*index)
                    .map(SlotMut::Value)
                    .ok_or_else(|| TransformError::missing(path)),
                _ => Err(TransformError::mismatch(path, ValueKind::Array)),
            },
        }
    }
}

impl From<&str> for FieldPath {
    fn from(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut key = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    let mut inner = String::new();
                    for c in chars.by_ref() {
                        if c == ']' {
                            break;
                        }
                        inner.push(c);
                    }
                    let segment = match inner.parse::<usize>() {
                        Ok(index) => Segment::Index(index),
                        Err(_) => Segment::Key(inner.trim_matches(|c| c == '"' || c == '\'').to_string()),
                    };
                    segments.push(segment);
                }
                _ => key.push(c),
            }
        }
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }

        Self { segments }
    }
}

impl From<String> for FieldPath {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if key.contains('.') || key.contains('[') => write!(f, "[\"{}\"]", key)?,
                Segment::Key(key) if position == 0 => write!(f, "{}", key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_dot_and_bracket_segments() {
        let path = FieldPath::from("pensionDebits[1].startDate");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("pensionDebits".to_string()),
                Segment::Index(1),
                Segment::Key("startDate".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "pensionDebits[1].startDate");
        assert_eq!(FieldPath::from("a[\"b.c\"]").to_string(), "a[\"b.c\"]");
    }

    #[test]
    fn test_lookup_nested_values() {
        let data = record(json!({
            "protection": {"type": 2, "status": null},
            "pensionDebits": [{"amount": 500}]
        }));

        assert_eq!(FieldPath::from("protection.type").get(&data), Some(&json!(2)));
        assert_eq!(FieldPath::from("protection.status").get(&data), Some(&Value::Null));
        assert_eq!(FieldPath::from("pensionDebits[0].amount").get(&data), Some(&json!(500)));
        assert_eq!(FieldPath::from("pensionDebits[3].amount").get(&data), None);
        assert_eq!(FieldPath::from("protection.version").get(&data), None);
    }

    #[test]
    fn test_lookup_through_scalar_is_type_mismatch() {
        let data = record(json!({"protection": "IP2014"}));

        let result = FieldPath::from("protection.type").lookup(&data);
        assert_eq!(
            result,
            Err(TransformError::mismatch("protection.type", ValueKind::Object))
        );
    }

    #[test]
    fn test_insert_creates_intermediate_objects() {
        let mut data = Record::new();
        FieldPath::from("protection.type").insert(&mut data, json!(2)).unwrap();
        FieldPath::from("nino").insert(&mut data, json!("AB123456")).unwrap();

        assert_eq!(
            Value::Object(data),
            json!({"protection": {"type": 2}, "nino": "AB123456"})
        );
    }

    #[test]
    fn test_insert_into_scalar_fails() {
        let mut data = record(json!({"protection": 7}));
        let result = FieldPath::from("protection.type").insert(&mut data, json!(2));
        assert!(matches!(result, Err(TransformError::TypeMismatch { .. })));
    }

    #[test]
    fn test_remove_nested_and_missing() {
        let mut data = record(json!({"protection": {"type": 2, "id": 1}, "nino": "AB"}));

        assert_eq!(FieldPath::from("protection.id").remove(&mut data), Some(json!(1)));
        assert_eq!(FieldPath::from("protection.id").remove(&mut data), None);
        assert_eq!(FieldPath::from("missing.branch").remove(&mut data), None);
        assert_eq!(
            Value::Object(data),
            json!({"protection": {"type": 2}, "nino": "AB"})
        );
    }
}
