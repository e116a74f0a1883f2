//! # phoenix-core
//!
//! Core library for the Phoenix CLI providing:
//! - Runtime configuration types with embedded defaults
//! - Hierarchical configuration loading (embedded, file, environment)
//! - Platform support matrix used to pick release assets

pub mod config;
pub mod error;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{Error, Result};
