//! Common test infrastructure for phoenix-update tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Slugs, versions, asset names, binary contents
//! - `builders`: Fluent builders for registry releases and assets
//! - `fixtures`: Release archives and validation files
//! - `fake_registry`: In-memory `ReleaseRegistry` with call counters
//! - `mock_server`: Wiremock setup for the HTTP registry client
//! - `updater_helpers`: Installed-executable and updater setup

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod fake_registry;
pub mod fixtures;
pub mod mock_server;
pub mod updater_helpers;

pub use builders::*;
pub use constants::*;
pub use fake_registry::*;
pub use fixtures::*;
pub use mock_server::*;
pub use updater_helpers::*;
