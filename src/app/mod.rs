pub mod connector;
pub mod service;

pub use connector::HttpRegistrationConnector;
pub use service::{split_nino, ProtectionService};
