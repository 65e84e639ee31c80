//! mathgen-sync library interface
//!
//! Mirrors the Mathematics Genealogy Project advisor graph into a local
//! SQLite store. Exposes the engine and its collaborators for the binary and
//! for integration testing.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::error::{SyncError, SyncResult};
pub use crate::models::{Directions, SyncMode, SyncReport};
pub use crate::services::{GenealogyClient, Resolution, SyncEngine};
pub use crate::types::{FetchError, PersonId, RawNode, RecordSource, SearchHit, SearchOutcome};
