//! Person operations
//!
//! A person owns its dissertation and advisor rows. Replacing or deleting a
//! person always replaces or deletes all of them in one transaction.

use mathgen_common::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::advisors::insert_advisor_edges;
use super::dissertations::insert_dissertation;
use crate::models::{NodeRecord, PersonRecord};
use crate::types::PersonId;

/// Remove every row owned by `id` (no-op when absent)
async fn delete_owned_rows(conn: &mut SqliteConnection, id: PersonId) -> Result<u64> {
    sqlx::query("DELETE FROM advised WHERE student = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM dissertation WHERE author = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    let deleted = sqlx::query("DELETE FROM person WHERE pid = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(deleted)
}

/// Write `record` as the complete local state of its person.
///
/// Existing person, dissertation and advisor rows for the identifier are
/// deleted first, so repeating the call never duplicates rows. Dissertations
/// are numbered from 1 in record order.
pub async fn replace_person(pool: &SqlitePool, record: &NodeRecord) -> Result<()> {
    let id = record.id();
    let mut tx = pool.begin().await?;

    delete_owned_rows(&mut tx, id).await?;

    sqlx::query("INSERT INTO person (pid, name, online_descendants) VALUES (?, ?, ?)")
        .bind(id)
        .bind(&record.person.name)
        .bind(record.person.online_descendants)
        .execute(&mut *tx)
        .await?;

    for (index, dissertation) in record.dissertations.iter().enumerate() {
        let seq = index as u32 + 1;
        insert_dissertation(&mut tx, id, seq, dissertation).await?;
        insert_advisor_edges(&mut tx, id, seq, &dissertation.advisors).await?;
    }

    tx.commit().await?;

    tracing::debug!(
        id,
        dissertations = record.dissertations.len(),
        "Person record replaced"
    );

    Ok(())
}

/// Delete a person and everything it owns. Returns whether a person row existed.
pub async fn delete_person(pool: &SqlitePool, id: PersonId) -> Result<bool> {
    let mut tx = pool.begin().await?;
    let deleted = delete_owned_rows(&mut tx, id).await?;
    tx.commit().await?;

    Ok(deleted > 0)
}

/// Load a person row by identifier
pub async fn load_person(pool: &SqlitePool, id: PersonId) -> Result<Option<PersonRecord>> {
    let row = sqlx::query("SELECT pid, name, online_descendants FROM person WHERE pid = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| PersonRecord {
        id: row.get("pid"),
        name: row.get("name"),
        online_descendants: row.get("online_descendants"),
    }))
}

/// Number of persons stored locally
pub async fn person_count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM person")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{direct_students, load_advisor_edges, load_dissertations};
    use crate::models::Dissertation;
    use mathgen_common::db::init_in_memory_database;
    use std::collections::BTreeSet;

    fn record(id: PersonId, dissertations: Vec<Dissertation>) -> NodeRecord {
        NodeRecord {
            person: PersonRecord {
                id,
                name: format!("Person {}", id),
                online_descendants: 0,
            },
            dissertations,
            students: BTreeSet::new(),
        }
    }

    fn dissertation(title: &str, advisors: Vec<PersonId>) -> Dissertation {
        Dissertation {
            title: Some(title.to_string()),
            university: Some("Universität Göttingen".to_string()),
            year: Some(1850),
            advisors,
        }
    }

    #[tokio::test]
    async fn test_replace_and_load_person() {
        let pool = init_in_memory_database().await.unwrap();

        replace_person(&pool, &record(7, vec![dissertation("D1", vec![3, 4])]))
            .await
            .unwrap();

        let person = load_person(&pool, 7).await.unwrap().unwrap();
        assert_eq!(person.name, "Person 7");

        let dissertations = load_dissertations(&pool, 7).await.unwrap();
        assert_eq!(dissertations.len(), 1);
        assert_eq!(dissertations[0].seq, 1);
        assert_eq!(dissertations[0].year, Some(1850));

        let edges = load_advisor_edges(&pool, 7).await.unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!((edges[1].advisor_order, edges[1].advisor), (2, 4));
    }

    #[tokio::test]
    async fn test_replace_overwrites_instead_of_merging() {
        let pool = init_in_memory_database().await.unwrap();

        replace_person(
            &pool,
            &record(7, vec![dissertation("Old 1", vec![3]), dissertation("Old 2", vec![5])]),
        )
        .await
        .unwrap();
        replace_person(&pool, &record(7, vec![dissertation("New", vec![9])]))
            .await
            .unwrap();

        let dissertations = load_dissertations(&pool, 7).await.unwrap();
        assert_eq!(dissertations.len(), 1);
        assert_eq!(dissertations[0].title.as_deref(), Some("New"));

        let edges = load_advisor_edges(&pool, 7).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].advisor, 9);
        assert!(direct_students(&pool, 3).await.unwrap().is_empty());
        assert_eq!(person_count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_person_removes_owned_rows() {
        let pool = init_in_memory_database().await.unwrap();

        replace_person(&pool, &record(7, vec![dissertation("D1", vec![3])]))
            .await
            .unwrap();

        assert!(delete_person(&pool, 7).await.unwrap());
        assert!(!delete_person(&pool, 7).await.unwrap());

        assert!(load_person(&pool, 7).await.unwrap().is_none());
        assert!(load_dissertations(&pool, 7).await.unwrap().is_empty());
        assert!(direct_students(&pool, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_direct_students_deduplicates_across_dissertations() {
        let pool = init_in_memory_database().await.unwrap();

        // Student 8 was advised by 3 for both dissertations
        replace_person(
            &pool,
            &record(8, vec![dissertation("A", vec![3]), dissertation("B", vec![3, 4])]),
        )
        .await
        .unwrap();
        replace_person(&pool, &record(9, vec![dissertation("C", vec![3])]))
            .await
            .unwrap();

        let students = direct_students(&pool, 3).await.unwrap();
        assert_eq!(students, BTreeSet::from([8, 9]));
    }
}
