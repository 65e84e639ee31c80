//! Last-name resolution
//!
//! Searches the remote site by last name. Every candidate is fetched and
//! stored; in preview mode the search page alone is reported and nothing is
//! written. No candidates (or a refused search) is a normal outcome.

use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::error::{SyncError, SyncResult};
use crate::models::NodeRecord;
use crate::services::sync_engine::{SyncEngine, TraversalContext};
use crate::types::{PersonId, RecordSource, SearchHit, SearchOutcome};
use crate::utils::retry_transient;

/// Summary of one stored candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCandidate {
    pub id: PersonId,
    pub name: String,
    pub university: Option<String>,
    pub year: Option<i32>,
}

impl From<&NodeRecord> for ResolvedCandidate {
    fn from(record: &NodeRecord) -> Self {
        Self {
            id: record.id(),
            name: record.person.name.clone(),
            university: record.first_university().map(str::to_string),
            year: record.first_year(),
        }
    }
}

impl fmt::Display for ResolvedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.name)?;
        if let Some(university) = &self.university {
            write!(f, ", {}", university)?;
        }
        if let Some(year) = self.year {
            write!(f, " ({})", year)?;
        }
        Ok(())
    }
}

/// Why a name could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvableReason {
    NoCandidates,
    TooManyCandidates,
}

impl UnresolvableReason {
    /// Guidance printed for the user
    pub fn guidance(&self) -> &'static str {
        match self {
            UnresolvableReason::NoCandidates => {
                "No records match this name. Use the advanced search on the \
                 genealogy site, then sync by identifier with `ids <ID>`."
            }
            UnresolvableReason::TooManyCandidates => {
                "Too many records match this name. Use the advanced search on \
                 the genealogy site, then sync by identifier with `ids <ID>`."
            }
        }
    }
}

/// Outcome of [`SyncEngine::resolve_name`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Resolution {
    /// Candidates fetched and stored, in search order
    Resolved(Vec<ResolvedCandidate>),
    /// Candidates as listed by the search page, nothing fetched or stored
    Preview(Vec<SearchHit>),
    Unresolvable(UnresolvableReason),
}

impl<S: RecordSource> SyncEngine<S> {
    /// Resolve a last name to remote records
    pub async fn resolve_name(&self, last_name: &str, preview: bool) -> SyncResult<Resolution> {
        let last_name = last_name.trim();
        if last_name.is_empty() {
            return Err(SyncError::InvalidInput("last name must not be empty".to_string()));
        }

        let mut ctx = TraversalContext::new();
        let operation = format!("search {:?}", last_name);
        let outcome = retry_transient(&operation, self.retry_policy(), || {}, || {
            self.source().search(last_name)
        })
        .await?;

        let hits = match outcome {
            SearchOutcome::TooMany => {
                info!(last_name, "Search refused: too many records");
                return Ok(Resolution::Unresolvable(UnresolvableReason::TooManyCandidates));
            }
            SearchOutcome::Candidates(hits) if hits.is_empty() => {
                info!(last_name, "No candidates found");
                return Ok(Resolution::Unresolvable(UnresolvableReason::NoCandidates));
            }
            SearchOutcome::Candidates(hits) => hits,
        };

        info!(last_name, candidates = hits.len(), "Search found candidates");

        if preview {
            return Ok(Resolution::Preview(hits));
        }

        let mut resolved = Vec::with_capacity(hits.len());
        for hit in &hits {
            let record = self.grab_node(&mut ctx, hit.id).await?;
            self.insert_or_update(&mut ctx, &record).await?;

            let candidate = ResolvedCandidate::from(&record);
            info!(id = candidate.id, "Resolved candidate: {}", candidate);
            resolved.push(candidate);
        }

        Ok(Resolution::Resolved(resolved))
    }
}
