//! Database initialization
//!
//! Opens (creating when missing) the SQLite database that backs reviewer
//! comments. Table creation is idempotent, so calling this on every startup
//! is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Busy timeout applied to every connection, in milliseconds
const BUSY_TIMEOUT_MS: i64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets comment reads proceed while another request writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    let pragma_sql = format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS);
    sqlx::query(&pragma_sql).execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables used by the service (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_comment_table(pool).await?;
    Ok(())
}

/// Create the comment table
///
/// One row per reviewer note on a (pmid, aspect, model) cell.
pub async fn create_comment_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pmid VARCHAR(20) NOT NULL,
            aspect VARCHAR(10) NOT NULL,
            model VARCHAR(50) NOT NULL,
            comment TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comment_pmid ON comment(pmid)")
        .execute(pool)
        .await?;

    Ok(())
}
