//! Test Helper Utilities
//!
//! Shared utilities for testing mathgen-sync

#![allow(dead_code)]

pub mod db_utils;
pub mod fake_source;
pub mod http_stub;

pub use db_utils::{create_test_db, create_test_pool, dump_rows};
pub use fake_source::{FakeSource, GraphBuilder};
pub use http_stub::{serve_once, CapturedRequest};
