pub mod engine;
pub mod inbound;
pub mod outbound;
pub mod rules;
pub mod vocabulary;

pub use crate::domain::model::Record;
pub use crate::domain::ports::{ConnectorResponse, RegistrationConnector};
pub use crate::utils::error::Result;
pub use rules::{BoxedRule, FieldRule, RuleResult};
