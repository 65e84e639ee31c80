//! Local descendant counting
//!
//! Counts the distinct persons reachable downward from a set of direct
//! students using only the local `advised` table. The direct students
//! themselves are included and the origin never is, matching how the remote
//! site counts descendants even when the stored graph loops back.

use mathgen_common::Result;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashSet};

use crate::db;
use crate::types::PersonId;

/// Read-only descendant counter over the local store
#[derive(Debug, Clone, Copy)]
pub struct DescendantCounter<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DescendantCounter<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Total descendants of `origin` reachable from its `direct_students`,
    /// each counted once
    pub async fn count(&self, origin: PersonId, direct_students: &BTreeSet<PersonId>) -> Result<u32> {
        let mut seen: HashSet<PersonId> = HashSet::from([origin]);
        let mut frontier: Vec<PersonId> = Vec::new();
        for student in direct_students {
            if seen.insert(*student) {
                frontier.push(*student);
            }
        }

        while let Some(advisor) = frontier.pop() {
            for student in db::direct_students(self.pool, advisor).await? {
                if seen.insert(student) {
                    frontier.push(student);
                }
            }
        }

        Ok((seen.len() - 1) as u32)
    }
}
