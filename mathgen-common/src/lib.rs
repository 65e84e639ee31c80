//! # mathgen Common Library
//!
//! Shared code for the mathgen crates:
//! - Error type and result alias
//! - Configuration loading (root folder, TOML config, remote settings)
//! - Database initialization for the local genealogy mirror

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use error::{Error, Result};
