//! Utility modules for mathgen-sync

pub mod fetch_retry;

pub use fetch_retry::{retry_transient, RetryPolicy};
