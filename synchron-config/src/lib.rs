//! Planner configuration loading and persistence
//!
//! Parses a TOML planner description into
//! [`PlannerConfig`](synchron_core::PlannerConfig) and stores it as
//! postcard binary data, falling back to the binary copy when no TOML file
//! is present.

// Must come first so the logging macros are visible to the other modules.
mod fmt;

pub mod loader;
pub mod toml;

pub use self::loader::{log_config_summary, ConfigError, ConfigStore};
pub use self::toml::{parse_config, ParseError};
