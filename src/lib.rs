pub mod aggregator;
pub mod config;
pub mod echo;
pub mod server;
pub mod webapp;

// Re-export for the binaries
pub use crate::aggregator::Aggregator;
pub use crate::config::{AggregatorConfig, EchoConfig, WebAppConfig};
