use crate::core::vocabulary::{Vocabularies, Vocabulary, PROTECTION_STATUSES, PROTECTION_TYPES};
use crate::utils::error::{BridgeError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub service: Option<ServiceConfig>,
    pub vocabulary: Option<VocabularyConfig>,
    pub registration: Option<RegistrationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub log_level: Option<String>,
}

/// 代碼表；位置即代碼，只能在尾端追加
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    pub protection_types: Option<Vec<String>>,
    pub protection_statuses: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

impl RegistrationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }
}

impl BridgeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BridgeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BridgeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REGISTRATION_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BridgeError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 建立代碼表，未設定的表使用內建預設值
    pub fn vocabularies(&self) -> Result<Vocabularies> {
        let tables = self.vocabulary.as_ref();
        let types = tables
            .and_then(|v| v.protection_types.clone())
            .unwrap_or_else(|| PROTECTION_TYPES.iter().map(|e| e.to_string()).collect());
        let statuses = tables
            .and_then(|v| v.protection_statuses.clone())
            .unwrap_or_else(|| PROTECTION_STATUSES.iter().map(|e| e.to_string()).collect());

        Ok(Vocabularies::new(
            Vocabulary::new("protection type", types)?,
            Vocabulary::new("protection status", statuses)?,
        ))
    }

    pub fn registration(&self) -> Result<&RegistrationConfig> {
        crate::utils::validation::validate_required_field("registration", &self.registration)
    }

    /// `[service] log_level`，作為 CLI 日誌的預設層級
    pub fn log_level(&self) -> Option<&str> {
        self.service.as_ref().and_then(|s| s.log_level.as_deref())
    }

    pub fn validate_config(&self) -> Result<()> {
        self.vocabularies()?;

        if let Some(registration) = &self.registration {
            crate::utils::validation::validate_url("registration.endpoint", &registration.endpoint)?;
            if let Some(timeout) = registration.timeout_seconds {
                crate::utils::validation::validate_range("registration.timeout_seconds", timeout, 1, 300)?;
            }
        }

        if let Some(service) = &self.service {
            crate::utils::validation::validate_non_empty_string("service.name", &service.name)?;
            if let Some(level) = &service.log_level {
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(BridgeError::InvalidConfigValueError {
                        field: "service.log_level".to_string(),
                        value: level.clone(),
                        reason: format!("Expected one of {}", LOG_LEVELS.join(", ")),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Validate for BridgeConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
