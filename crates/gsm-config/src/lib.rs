//! GSM BTS configuration management
//!
//! This crate provides configuration loading and parsing for the BTS stack:
//! - TOML configuration file parsing
//! - Stack configuration structures and shared runtime state

pub mod stack_config;
pub mod toml_config;

pub use stack_config::*;
pub use toml_config::*;
