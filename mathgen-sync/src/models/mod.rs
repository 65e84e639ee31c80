//! Data models for mathgen-sync
//!
//! - Normalized person/dissertation records
//! - Sync mode, direction flags and per-run statistics

pub mod record;
pub mod report;

pub use record::{AdvisorGroups, Dissertation, NodeRecord, PersonRecord};
pub use report::{Directions, SubtreeCheck, SyncMode, SyncReport};
