//! Process-level plumbing shared by the binaries: layered configuration and
//! `tracing` initialisation.

pub mod config;
pub mod logging;

pub use config::{AppConfig, CliArgs, LoggingConfig, Section, ServerConfig};
pub use logging::{init_default_logging, init_logging_from_config};
