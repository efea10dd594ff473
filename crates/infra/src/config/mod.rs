//! Configuration loading and representation.

pub mod network;

pub use network::{NetworkConfiguration, ProxyConfig, ServiceUrl, SocketOptions};

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration could not be parsed: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
