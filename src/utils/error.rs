use crate::domain::model::ValueKind;
use std::fmt;
use thiserror::Error;

/// 單一欄位規則失敗的原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Missing required field: {path}")]
    MissingRequiredField { path: String },

    #[error("Type mismatch at {path}: expected {expected}")]
    TypeMismatch { path: String, expected: ValueKind },

    #[error("Value {value:?} at {path} is not in the vocabulary")]
    UnknownVocabularyValue { path: String, value: String },

    #[error("Code {index} at {path} is outside the vocabulary")]
    IndexOutOfRange { path: String, index: i64 },

    #[error("Malformed element {index} in array {path}")]
    MalformedArrayElement { path: String, index: usize },

    #[error("Conflicting values written to {path}")]
    ConflictingOutput { path: String },
}

impl TransformError {
    pub fn missing(path: impl fmt::Display) -> Self {
        Self::MissingRequiredField {
            path: path.to_string(),
        }
    }

    pub fn mismatch(path: impl fmt::Display, expected: ValueKind) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::MissingRequiredField { path }
            | Self::TypeMismatch { path, .. }
            | Self::UnknownVocabularyValue { path, .. }
            | Self::IndexOutOfRange { path, .. }
            | Self::MalformedArrayElement { path, .. }
            | Self::ConflictingOutput { path } => path,
        }
    }

    /// 只有「欄位不存在」能被 fallback 吸收
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::MissingRequiredField { .. })
    }
}

/// 累積的規則錯誤，保證至少一筆
#[derive(Debug, Clone, PartialEq)]
pub struct TransformErrors(Vec<TransformError>);

impl TransformErrors {
    pub fn new(first: TransformError) -> Self {
        Self(vec![first])
    }

    pub fn merge(mut self, other: TransformErrors) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransformError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> &TransformError {
        &self.0[0]
    }

    pub fn into_vec(self) -> Vec<TransformError> {
        self.0
    }

    pub fn all_absent(&self) -> bool {
        self.0.iter().all(TransformError::is_absence)
    }
}

impl From<TransformError> for TransformErrors {
    fn from(error: TransformError) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for TransformErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for TransformErrors {}

/// 詞彙表層級的錯誤，由欄位規則補上路徑後轉成 `TransformError`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("{value:?} is not an entry of the {table} table")]
    UnknownValue { table: String, value: String },

    #[error("{index} is outside the {table} table (len {len})")]
    IndexOutOfRange {
        table: String,
        index: i64,
        len: usize,
    },
}

impl CodecError {
    pub fn at(self, path: impl fmt::Display) -> TransformError {
        match self {
            Self::UnknownValue { value, .. } => TransformError::UnknownVocabularyValue {
                path: path.to_string(),
                value,
            },
            Self::IndexOutOfRange { index, .. } => TransformError::IndexOutOfRange {
                path: path.to_string(),
                index,
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Malformed request: {0}")]
    BadRequest(TransformErrors),

    #[error("Registration response could not be transformed: {0}")]
    MalformedResponse(TransformErrors),

    #[error("Registration rejected by downstream system (status {status}): {body}")]
    DownstreamRejected { status: u16, body: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value {value:?} for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },
}

/// 呼叫端據此選擇回應狀態碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BadRequest,
    Downstream,
    Configuration,
    System,
}

impl BridgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BadRequest(_) => ErrorCategory::BadRequest,
            Self::MalformedResponse(_) | Self::DownstreamRejected { .. } | Self::ApiError(_) => {
                ErrorCategory::Downstream
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn http_status(&self) -> u16 {
        match self.category() {
            ErrorCategory::BadRequest => 400,
            ErrorCategory::Downstream => 502,
            ErrorCategory::Configuration | ErrorCategory::System => 500,
        }
    }

    /// 結構錯誤的明細；其他種類沒有
    pub fn transform_errors(&self) -> Option<&TransformErrors> {
        match self {
            Self::BadRequest(errors) | Self::MalformedResponse(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::BadRequest(errors) => format!("The application could not be accepted: {}", errors),
            Self::MalformedResponse(_) => {
                "The registration system returned a response that could not be read".to_string()
            }
            Self::DownstreamRejected { status, .. } => {
                format!("The registration system rejected the request (status {})", status)
            }
            Self::ApiError(_) => "The registration system could not be reached".to_string(),
            Self::IoError(e) => format!("File access failed: {}", e),
            Self::SerializationError(e) => format!("Invalid JSON: {}", e),
            _ => format!("Configuration problem: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::BadRequest => "Correct the listed fields and resubmit the application",
            ErrorCategory::Downstream => "Check the registration system status and retry later",
            ErrorCategory::Configuration => "Check the TOML configuration and environment variables",
            ErrorCategory::System => "Check the input file path and that it contains valid JSON",
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_accumulate_in_order() {
        let errors = TransformErrors::new(TransformError::missing("protectionType"))
            .merge(TransformError::mismatch("relevantAmount", ValueKind::Number).into());

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first().path(), "protectionType");
        assert!(!errors.all_absent());
        assert_eq!(
            errors.to_string(),
            "Missing required field: protectionType; Type mismatch at relevantAmount: expected number"
        );
    }

    #[test]
    fn test_codec_error_gets_field_path() {
        let error = CodecError::IndexOutOfRange {
            table: "protection status".to_string(),
            index: 9,
            len: 7,
        }
        .at("status");

        assert_eq!(
            error,
            TransformError::IndexOutOfRange {
                path: "status".to_string(),
                index: 9
            }
        );
    }

    #[test]
    fn test_categories_separate_request_and_downstream_failures() {
        let bad = BridgeError::BadRequest(TransformError::missing("protectionType").into());
        let malformed = BridgeError::MalformedResponse(TransformError::missing("protection.type").into());
        let rejected = BridgeError::DownstreamRejected {
            status: 409,
            body: "{}".to_string(),
        };

        assert_eq!(bad.category(), ErrorCategory::BadRequest);
        assert_eq!(bad.http_status(), 400);
        assert_eq!(malformed.category(), ErrorCategory::Downstream);
        assert_eq!(rejected.http_status(), 502);
        assert!(rejected.transform_errors().is_none());
    }
}
