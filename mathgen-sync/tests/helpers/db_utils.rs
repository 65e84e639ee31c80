//! Database Test Utilities

use anyhow::Result;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// In-memory database with the schema applied
pub async fn create_test_pool() -> SqlitePool {
    mathgen_common::db::init_in_memory_database()
        .await
        .expect("in-memory database")
}

/// Temporary on-disk database
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_mathgen.db");
    let pool = mathgen_sync::db::init_database_pool(&db_path).await?;
    Ok((temp_dir, pool))
}

/// Every row of every table, in key order, for whole-store comparisons
pub async fn dump_rows(pool: &SqlitePool) -> Vec<String> {
    let mut rows = Vec::new();

    let persons: Vec<(i64, String, i64)> =
        sqlx::query_as("SELECT pid, name, online_descendants FROM person ORDER BY pid")
            .fetch_all(pool)
            .await
            .unwrap();
    rows.extend(persons.iter().map(|r| format!("person {:?}", r)));

    let dissertations: Vec<(i64, i64, Option<String>, Option<String>, Option<i64>)> = sqlx::query_as(
        "SELECT author, seq, title, university, year FROM dissertation ORDER BY author, seq",
    )
    .fetch_all(pool)
    .await
    .unwrap();
    rows.extend(dissertations.iter().map(|r| format!("dissertation {:?}", r)));

    let advised: Vec<(i64, i64, i64, i64)> = sqlx::query_as(
        "SELECT student, seq, advisor_order, advisor FROM advised ORDER BY student, seq, advisor_order",
    )
    .fetch_all(pool)
    .await
    .unwrap();
    rows.extend(advised.iter().map(|r| format!("advised {:?}", r)));

    rows
}
