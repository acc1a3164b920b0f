//! Tests for database initialization
//!
//! - Database file is created automatically on first run
//! - Re-opening an existing database is safe (idempotent schema)
//! - The comment table has the expected columns

use arev_common::db::init::init_database;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("comments.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("comments.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_comment_table_columns() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("comments.db")).await.unwrap();

    let columns: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info('comment')")
        .fetch_all(&pool)
        .await
        .unwrap();
    let names: Vec<String> = columns.into_iter().map(|(name,)| name).collect();

    assert_eq!(names, vec!["id", "pmid", "aspect", "model", "comment"]);
}
