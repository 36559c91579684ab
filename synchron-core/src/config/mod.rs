//! Configuration types
//!
//! Board-agnostic planner configuration, parsed from TOML or stored as
//! postcard binary data by `synchron-config`.

pub mod types;

pub use types::*;
