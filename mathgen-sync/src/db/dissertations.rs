//! Dissertation operations

use mathgen_common::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::models::Dissertation;
use crate::types::PersonId;

/// Stored dissertation row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDissertation {
    pub seq: u32,
    pub title: Option<String>,
    pub university: Option<String>,
    pub year: Option<i32>,
}

pub(crate) async fn insert_dissertation(
    conn: &mut SqliteConnection,
    author: PersonId,
    seq: u32,
    dissertation: &Dissertation,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO dissertation (author, seq, title, university, year)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(author)
    .bind(seq)
    .bind(&dissertation.title)
    .bind(&dissertation.university)
    .bind(dissertation.year)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Dissertations of `author` in insertion order
pub async fn load_dissertations(pool: &SqlitePool, author: PersonId) -> Result<Vec<StoredDissertation>> {
    let rows = sqlx::query(
        r#"
        SELECT seq, title, university, year
        FROM dissertation
        WHERE author = ?
        ORDER BY seq
        "#,
    )
    .bind(author)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| StoredDissertation {
            seq: row.get("seq"),
            title: row.get("title"),
            university: row.get("university"),
            year: row.get("year"),
        })
        .collect())
}
