//! Sync run statistics and options
//!
//! `SyncReport` is returned by every engine entry point and printed by the
//! CLI once the run finishes.

use serde::{Deserialize, Serialize};

/// Update policy for descendant walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Always descend and rewrite every reachable student
    Naive,
    /// Skip subtrees whose local descendant count matches the remote count
    #[default]
    Smart,
}

/// Which directions to walk from each root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Directions {
    pub ancestors: bool,
    pub descendants: bool,
}

impl Directions {
    pub fn both() -> Self {
        Self {
            ancestors: true,
            descendants: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Outcome of comparing local knowledge with the remote descendant count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubtreeCheck {
    /// Local count equals remote count: children are skipped
    UpToDate { local: u32 },
    /// Local count below remote count: keep descending
    Incomplete { local: u32, online: u32 },
    /// Local count above remote count: local students were deleted
    Drifted { local: u32, online: u32, deleted: usize },
    /// No local students and remote reports at most one descendant
    KnownLeaf,
    /// No local students but remote reports several descendants
    Unknown { online: u32 },
    /// Naive mode never checks
    NotChecked,
}

impl SubtreeCheck {
    /// Whether the walk continues into this node's students
    pub fn descend(&self) -> bool {
        !matches!(self, SubtreeCheck::UpToDate { .. } | SubtreeCheck::KnownLeaf)
    }
}

/// Counters for one engine invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Root identifiers processed
    pub roots: usize,
    /// Successful record fetches (retries not counted)
    pub fetched: usize,
    /// Records written or overwritten
    pub persisted: usize,
    /// Fetch attempts that failed transiently and were repeated
    pub retries: usize,
    /// Ancestors reached by the upward walk
    pub ancestors_synced: usize,
    /// Descendants reached by the downward walk
    pub descendants_synced: usize,
    /// Nodes whose children were skipped as already current
    pub skipped_subtrees: usize,
    /// Nodes where remote deletions were detected
    pub drift_repairs: usize,
    /// Local student records removed by drift repair
    pub students_deleted: usize,
}

impl SyncReport {
    pub fn display_string(&self) -> String {
        format!(
            "{} root(s): {} fetched, {} persisted ({} ancestors, {} descendants), \
             {} subtree(s) skipped, {} drift repair(s) removing {} student(s), {} retries",
            self.roots,
            self.fetched,
            self.persisted,
            self.ancestors_synced,
            self.descendants_synced,
            self.skipped_subtrees,
            self.drift_repairs,
            self.students_deleted,
            self.retries,
        )
    }
}
