//! Advisor edge operations
//!
//! `advised(student, seq, advisor_order, advisor)`: one row per advisor of
//! one dissertation. Rows are owned by the student.

use mathgen_common::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::BTreeSet;

use crate::types::PersonId;

/// Stored advisor edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorEdge {
    /// Dissertation number within the student's record (1-based)
    pub seq: u32,
    /// Rank of the advisor for that dissertation (1-based)
    pub advisor_order: u32,
    pub advisor: PersonId,
}

/// Insert the advisor edges of one dissertation, ranking from 1
pub(crate) async fn insert_advisor_edges(
    conn: &mut SqliteConnection,
    student: PersonId,
    seq: u32,
    advisors: &[PersonId],
) -> Result<()> {
    for (index, advisor) in advisors.iter().enumerate() {
        sqlx::query(
            "INSERT INTO advised (student, seq, advisor_order, advisor) VALUES (?, ?, ?, ?)",
        )
        .bind(student)
        .bind(seq)
        .bind(index as u32 + 1)
        .bind(*advisor)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Identifiers locally recorded as direct students of `advisor`
pub async fn direct_students(pool: &SqlitePool, advisor: PersonId) -> Result<BTreeSet<PersonId>> {
    let students: Vec<PersonId> =
        sqlx::query_scalar("SELECT DISTINCT student FROM advised WHERE advisor = ?")
            .bind(advisor)
            .fetch_all(pool)
            .await?;

    Ok(students.into_iter().collect())
}

/// All advisor edges owned by `student`, ordered by dissertation then rank
pub async fn load_advisor_edges(pool: &SqlitePool, student: PersonId) -> Result<Vec<AdvisorEdge>> {
    let rows = sqlx::query(
        r#"
        SELECT seq, advisor_order, advisor
        FROM advised
        WHERE student = ?
        ORDER BY seq, advisor_order
        "#,
    )
    .bind(student)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| AdvisorEdge {
            seq: row.get("seq"),
            advisor_order: row.get("advisor_order"),
            advisor: row.get("advisor"),
        })
        .collect())
}
