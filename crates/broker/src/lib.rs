// Typed client for an Alpaca-compatible brokerage REST API.
// Consumed by the MCP crate through the Brokerage trait.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{AlpacaClient, Brokerage};
pub use config::BrokerConfig;
pub use error::{BrokerError, BrokerResult};
