pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use app::{HttpRegistrationConnector, ProtectionService};
pub use config::toml_config::BridgeConfig;
pub use crate::core::engine::ProtectionBridge;
pub use crate::core::vocabulary::{Vocabularies, Vocabulary};
pub use utils::error::{BridgeError, Result, TransformError, TransformErrors};
