//! Database initialization
//!
//! Creates the genealogy tables on first run. Safe to call on every startup:
//! all statements are `IF NOT EXISTS`.
//!
//! Ownership rules enforced by foreign keys:
//! - `dissertation.author` → `person.pid` (ON DELETE CASCADE)
//! - `advised(student, seq)` → `dissertation(author, seq)` (ON DELETE CASCADE)
//!
//! `advised.advisor` is deliberately not a foreign key: advisors are often
//! known only by identifier until an ancestor walk fetches them.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Open (creating if needed) the database file and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Single connection: the sync engine is the only writer and reader
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema (tests and dry runs)
pub async fn init_in_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_person_table(pool).await?;
    create_dissertation_table(pool).await?;
    create_advised_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// One row per mathematician, keyed by the remote identifier
async fn create_person_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS person (
            pid INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            online_descendants INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Dissertations in page order (`seq` is 1-based)
async fn create_dissertation_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dissertation (
            author INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            title TEXT,
            university TEXT,
            year INTEGER,
            PRIMARY KEY (author, seq),
            FOREIGN KEY (author) REFERENCES person(pid) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Advisor edges; `advisor_order` restarts at 1 for every dissertation
async fn create_advised_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS advised (
            student INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            advisor_order INTEGER NOT NULL,
            advisor INTEGER NOT NULL,
            PRIMARY KEY (student, seq, advisor_order),
            FOREIGN KEY (student, seq) REFERENCES dissertation(author, seq) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_advised_advisor ON advised(advisor)")
        .execute(pool)
        .await?;

    Ok(())
}
