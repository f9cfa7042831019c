//! Configuration file handling

#[allow(clippy::module_inception)]
pub mod config;

pub use config::{Config, OutputConfig, ServerConfig};
