//! Core types and the remote record source seam
//!
//! The sync engine only talks to the remote genealogy database through
//! [`RecordSource`]. The HTTP implementation lives in
//! `services::genealogy_client`; tests substitute a scripted source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Remote-assigned person identifier (primary key locally)
pub type PersonId = u32;

/// Reserved value separating per-dissertation advisor groups in a
/// [`RawNode::advisor_sequence`]. Never a valid identifier.
pub const ADVISOR_SENTINEL: PersonId = 0;

/// A person record exactly as the remote page presents it
///
/// `universities`, `years` and `titles` are parallel lists with one entry per
/// dissertation. `advisor_sequence` is the flat advisor list over all
/// dissertations, groups separated by [`ADVISOR_SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub id: PersonId,
    pub name: String,
    pub universities: Vec<Option<String>>,
    pub years: Vec<Option<i32>>,
    pub titles: Vec<Option<String>>,
    pub advisor_sequence: Vec<PersonId>,
    pub students: BTreeSet<PersonId>,
    /// Total descendant count reported by the remote site at fetch time
    pub online_descendants: u32,
}

/// One row of a name search result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: PersonId,
    pub name: Option<String>,
    pub university: Option<String>,
    pub year: Option<i32>,
}

/// Result of a remote name search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Zero or more matching records, in page order
    Candidates(Vec<SearchHit>),
    /// The remote site refused to enumerate the result set
    TooMany,
}

/// Errors reported by a [`RecordSource`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The remote database has no record with this identifier
    #[error("Record not found: {0}")]
    NotFound(PersonId),

    /// Page was reachable but malformed or truncated
    #[error("Parse error: {0}")]
    Parse(String),

    /// Server-side failure that is worth retrying (5xx, timeout)
    #[error("Transient remote error: {0}")]
    Transient(String),

    /// Endpoint unreachable (DNS, connection refused, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Any other unexpected HTTP status
    #[error("API error {0}: {1}")]
    Api(u16, String),
}

impl FetchError {
    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Parse(_) | FetchError::Transient(_))
    }
}

/// Remote genealogy database
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the full record page for `id`
    async fn fetch(&self, id: PersonId) -> Result<RawNode, FetchError>;

    /// Search by last name
    async fn search(&self, last_name: &str) -> Result<SearchOutcome, FetchError>;
}
