//! Recursive genealogy synchronization
//!
//! Walks the advisor graph upward and the student graph downward from one or
//! more root identifiers, replacing every reached person in the local store.
//!
//! **Traversal:** depth-first over an explicit work stack. Each direction has
//! its own visited set inside a [`TraversalContext`] shared by all roots of
//! one invocation; an identifier is marked right after its fetch succeeds and
//! before its neighbours are pushed.
//!
//! **Smart mode:** after persisting a node, the remote descendant count is
//! compared with the count reachable through locally stored students
//! ([`SyncEngine::check_subtree`]). Matching counts skip the node's children.
//! A local surplus means students were removed remotely; all locally recorded
//! direct students are then deleted and the walk re-descends.

use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

use crate::db;
use crate::error::{SyncError, SyncResult};
use crate::models::{Directions, NodeRecord, SubtreeCheck, SyncMode, SyncReport};
use crate::services::DescendantCounter;
use crate::types::{PersonId, RecordSource, ADVISOR_SENTINEL};
use crate::utils::{retry_transient, RetryPolicy};

/// Per-invocation traversal state
#[derive(Debug, Default)]
pub struct TraversalContext {
    ancestors_visited: HashSet<PersonId>,
    descendants_visited: HashSet<PersonId>,
    report: SyncReport,
}

impl TraversalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ancestor_visited(&self, id: PersonId) -> bool {
        self.ancestors_visited.contains(&id)
    }

    pub fn descendant_visited(&self, id: PersonId) -> bool {
        self.descendants_visited.contains(&id)
    }

    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    pub fn into_report(self) -> SyncReport {
        self.report
    }
}

/// Synchronization engine over a record source and the local store
pub struct SyncEngine<S: RecordSource> {
    source: S,
    pool: SqlitePool,
    mode: SyncMode,
    retry: RetryPolicy,
}

impl<S: RecordSource> SyncEngine<S> {
    /// Smart mode, default retry policy
    pub fn new(source: S, pool: SqlitePool) -> Self {
        Self {
            source,
            pool,
            mode: SyncMode::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub(crate) fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch and normalize one record, retrying transient failures
    pub async fn grab_node(&self, ctx: &mut TraversalContext, id: PersonId) -> SyncResult<NodeRecord> {
        info!(id, "Grabbing record");

        let operation = format!("fetch record {}", id);
        let report = &mut ctx.report;
        let raw = retry_transient(&operation, &self.retry, || report.retries += 1, || {
            self.source.fetch(id)
        })
        .await?;

        ctx.report.fetched += 1;
        Ok(NodeRecord::from_raw(raw))
    }

    /// Replace everything stored for this person
    pub async fn insert_or_update(&self, ctx: &mut TraversalContext, record: &NodeRecord) -> SyncResult<()> {
        db::replace_person(&self.pool, record).await?;
        ctx.report.persisted += 1;

        debug!(
            id = record.id(),
            name = %record.person.name,
            dissertations = record.dissertations.len(),
            "Stored record"
        );
        Ok(())
    }

    /// Decide whether the children of a freshly stored node need a walk.
    ///
    /// Repairs remote drift as a side effect: when more descendants are known
    /// locally than the remote site reports, every locally recorded direct
    /// student is deleted. The visited sets are left untouched, so a deleted
    /// student already synced in this invocation is restored by the next one.
    pub async fn check_subtree(&self, ctx: &mut TraversalContext, record: &NodeRecord) -> SyncResult<SubtreeCheck> {
        if self.mode == SyncMode::Naive {
            return Ok(SubtreeCheck::NotChecked);
        }

        let id = record.id();
        let online = record.person.online_descendants;
        let local_students = db::direct_students(&self.pool, id).await?;

        if local_students.is_empty() {
            return Ok(if online < 2 {
                debug!(id, online, "No local students, remote count marks a leaf");
                SubtreeCheck::KnownLeaf
            } else {
                SubtreeCheck::Unknown { online }
            });
        }

        let local = DescendantCounter::new(&self.pool).count(id, &local_students).await?;
        info!(id, online, local, "Online descendants");

        if local == online {
            info!(id, "Skip branch");
            ctx.report.skipped_subtrees += 1;
            return Ok(SubtreeCheck::UpToDate { local });
        }

        if local < online {
            return Ok(SubtreeCheck::Incomplete { local, online });
        }

        warn!(
            id,
            online,
            local,
            students = local_students.len(),
            "More local than online descendants, deleting local students"
        );

        let mut deleted = 0;
        for student in &local_students {
            if db::delete_person(&self.pool, *student).await? {
                deleted += 1;
            }
        }

        ctx.report.drift_repairs += 1;
        ctx.report.students_deleted += deleted;

        Ok(SubtreeCheck::Drifted { local, online, deleted })
    }

    /// Fetch and store every unvisited ancestor reachable from `advisors`
    pub async fn walk_ancestors(
        &self,
        ctx: &mut TraversalContext,
        advisors: impl IntoIterator<Item = PersonId>,
    ) -> SyncResult<()> {
        let mut stack: Vec<PersonId> = advisors.into_iter().collect();
        stack.reverse();

        while let Some(id) = stack.pop() {
            if id == ADVISOR_SENTINEL || ctx.ancestors_visited.contains(&id) {
                continue;
            }

            let record = self.grab_node(ctx, id).await?;
            ctx.ancestors_visited.insert(id);
            self.insert_or_update(ctx, &record).await?;
            ctx.report.ancestors_synced += 1;

            let next: Vec<PersonId> = record
                .advisors()
                .filter(|advisor| !ctx.ancestors_visited.contains(advisor))
                .collect();
            stack.extend(next.into_iter().rev());
        }

        Ok(())
    }

    /// Fetch and store every unvisited descendant reachable from `students`,
    /// skipping subtrees proven current in smart mode
    pub async fn walk_descendants(&self, ctx: &mut TraversalContext, students: &BTreeSet<PersonId>) -> SyncResult<()> {
        let mut stack: Vec<PersonId> = students.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if ctx.descendants_visited.contains(&id) {
                continue;
            }

            let record = self.grab_node(ctx, id).await?;
            ctx.descendants_visited.insert(id);
            self.insert_or_update(ctx, &record).await?;
            ctx.report.descendants_synced += 1;

            if self.check_subtree(ctx, &record).await?.descend() {
                stack.extend(
                    record
                        .students
                        .iter()
                        .rev()
                        .filter(|student| !ctx.descendants_visited.contains(*student)),
                );
            }
        }

        Ok(())
    }

    /// Synchronize each root and walk the requested directions.
    ///
    /// Identifiers are processed in order, duplicates once. The sentinel value
    /// is rejected before anything is fetched.
    pub async fn sync_ids(&self, ids: &[PersonId], directions: Directions) -> SyncResult<SyncReport> {
        if ids.contains(&ADVISOR_SENTINEL) {
            return Err(SyncError::InvalidInput(format!(
                "{} is not a valid record identifier",
                ADVISOR_SENTINEL
            )));
        }

        let mut ctx = TraversalContext::new();
        let mut seen_roots = HashSet::new();

        info!(
            roots = ids.len(),
            ancestors = directions.ancestors,
            descendants = directions.descendants,
            mode = ?self.mode,
            "Starting synchronization"
        );

        for &id in ids {
            if !seen_roots.insert(id) {
                continue;
            }
            self.sync_root(&mut ctx, id, directions).await?;
        }

        let report = ctx.into_report();
        info!("Synchronization complete: {}", report.display_string());
        Ok(report)
    }

    async fn sync_root(&self, ctx: &mut TraversalContext, id: PersonId, directions: Directions) -> SyncResult<()> {
        ctx.report.roots += 1;

        let record = self.grab_node(ctx, id).await?;
        ctx.ancestors_visited.insert(id);
        ctx.descendants_visited.insert(id);
        self.insert_or_update(ctx, &record).await?;

        if directions.ancestors {
            self.walk_ancestors(ctx, record.advisors().collect::<Vec<_>>()).await?;
        }

        if directions.descendants && self.check_subtree(ctx, &record).await?.descend() {
            self.walk_descendants(ctx, &record.students).await?;
        }

        Ok(())
    }
}
