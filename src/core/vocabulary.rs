use crate::utils::error::{BridgeError, CodecError, Result};
use std::collections::HashSet;
use std::sync::Arc;

pub const PROTECTION_TYPES: [&str; 8] = [
    "Unknown", "FP2016", "IP2014", "IP2016", "Primary", "Enhanced", "Fixed", " FP2014",
];

pub const PROTECTION_STATUSES: [&str; 7] = [
    "Unknown",
    "Open",
    "Dormant",
    "Withdrawn",
    "Expired",
    "Unsuccessful",
    "Rejected",
];

/// 固定順序的名稱表，名稱的位置就是對外保存的整數代碼
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    name: String,
    entries: Vec<String>,
}

impl Vocabulary {
    pub fn new(name: impl Into<String>, entries: Vec<String>) -> Result<Self> {
        let name = name.into();
        if entries.is_empty() {
            return Err(BridgeError::InvalidConfigValueError {
                field: name,
                value: "[]".to_string(),
                reason: "Vocabulary table cannot be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.as_str()) {
                return Err(BridgeError::InvalidConfigValueError {
                    field: name,
                    value: entry.clone(),
                    reason: "Duplicate vocabulary entry".to_string(),
                });
            }
        }

        Ok(Self { name, entries })
    }

    fn from_static(name: &str, entries: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            entries: entries.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self, value: &str) -> std::result::Result<usize, CodecError> {
        self.entries
            .iter()
            .position(|entry| entry == value)
            .ok_or_else(|| CodecError::UnknownValue {
                table: self.name.clone(),
                value: value.to_string(),
            })
    }

    pub fn decode(&self, index: i64) -> std::result::Result<&str, CodecError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
            .ok_or_else(|| CodecError::IndexOutOfRange {
                table: self.name.clone(),
                index,
                len: self.entries.len(),
            })
    }
}

/// 啟動時載入一次，以 `Arc` 注入兩條管線
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabularies {
    pub protection_types: Arc<Vocabulary>,
    pub protection_statuses: Arc<Vocabulary>,
}

impl Vocabularies {
    pub fn new(protection_types: Vocabulary, protection_statuses: Vocabulary) -> Self {
        Self {
            protection_types: Arc::new(protection_types),
            protection_statuses: Arc::new(protection_statuses),
        }
    }
}

impl Default for Vocabularies {
    fn default() -> Self {
        Self::new(
            Vocabulary::from_static("protection type", &PROTECTION_TYPES),
            Vocabulary::from_static("protection status", &PROTECTION_STATUSES),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_have_fixed_positions() {
        let vocab = Vocabularies::default();

        assert_eq!(vocab.protection_types.len(), 8);
        assert_eq!(vocab.protection_statuses.len(), 7);
        assert_eq!(vocab.protection_types.encode("IP2014"), Ok(2));
        assert_eq!(vocab.protection_types.encode(" FP2014"), Ok(7));
        assert_eq!(vocab.protection_statuses.decode(0), Ok("Unknown"));
        assert_eq!(vocab.protection_statuses.decode(6), Ok("Rejected"));
    }

    #[test]
    fn test_encode_unknown_value_fails() {
        let vocab = Vocabularies::default();

        assert_eq!(
            vocab.protection_types.encode("FP2014"),
            Err(CodecError::UnknownValue {
                table: "protection type".to_string(),
                value: "FP2014".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_out_of_range() {
        let vocab = Vocabularies::default();
        let types = &vocab.protection_types;

        assert!(matches!(types.decode(8), Err(CodecError::IndexOutOfRange { index: 8, len: 8, .. })));
        assert!(matches!(types.decode(-1), Err(CodecError::IndexOutOfRange { index: -1, .. })));
    }

    #[test]
    fn test_new_rejects_empty_and_duplicate_tables() {
        assert!(Vocabulary::new("empty", vec![]).is_err());
        assert!(Vocabulary::new("dup", vec!["Open".to_string(), "Open".to_string()]).is_err());
        assert!(Vocabulary::new("ok", vec!["Unknown".to_string(), "Open".to_string()]).is_ok());
    }
}
