//! Local genealogy store
//!
//! Free functions over a `SqlitePool`, one module per table. Writes that
//! touch several tables run in a single transaction so a person is always
//! either fully present or absent.

pub mod advisors;
pub mod dissertations;
pub mod persons;

use mathgen_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

pub use advisors::{direct_students, load_advisor_edges, AdvisorEdge};
pub use dissertations::{load_dissertations, StoredDissertation};
pub use persons::{delete_person, load_person, person_count, replace_person};

/// Open the database file, creating the schema on first run
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());
    mathgen_common::db::init_database(db_path).await
}
