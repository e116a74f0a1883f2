//! Type definitions for Phoenix configuration

mod platform_matrix;
mod runtime_config;

pub use platform_matrix::*;
pub use runtime_config::*;
