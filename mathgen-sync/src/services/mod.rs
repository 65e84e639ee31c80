//! Synchronization services
//!
//! - `genealogy_client` / `page_parser`: remote record source over HTTP
//! - `descendant_counter`: local descendant totals for the skip heuristic
//! - `sync_engine`: ancestor and descendant walks
//! - `name_resolution`: last-name search entry point

pub mod descendant_counter;
pub mod genealogy_client;
pub mod name_resolution;
pub mod page_parser;
pub mod sync_engine;

pub use descendant_counter::DescendantCounter;
pub use genealogy_client::GenealogyClient;
pub use name_resolution::{Resolution, ResolvedCandidate, UnresolvableReason};
pub use sync_engine::{SyncEngine, TraversalContext};
