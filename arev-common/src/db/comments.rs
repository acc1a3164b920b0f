//! Reviewer comment store
//!
//! Free-text notes keyed by (pmid, aspect, model). Plain CRUD over the
//! `comment` table; the ingest pipeline never touches it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// A stored reviewer comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub pmid: String,
    pub aspect: String,
    pub model: String,
    pub comment: String,
}

/// Fields supplied when creating a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub pmid: String,
    pub aspect: String,
    pub model: String,
    pub comment: String,
}

type CommentRow = (i64, String, String, String, String);

impl From<CommentRow> for Comment {
    fn from((id, pmid, aspect, model, comment): CommentRow) -> Self {
        Self {
            id,
            pmid,
            aspect,
            model,
            comment,
        }
    }
}

/// Insert a comment and return it with its assigned id
pub async fn insert_comment(pool: &SqlitePool, new: NewComment) -> Result<Comment> {
    if new.pmid.is_empty() {
        return Err(Error::InvalidInput("pmid must not be empty".to_string()));
    }

    let result = sqlx::query(
        "INSERT INTO comment (pmid, aspect, model, comment) VALUES (?, ?, ?, ?)",
    )
    .bind(&new.pmid)
    .bind(&new.aspect)
    .bind(&new.model)
    .bind(&new.comment)
    .execute(pool)
    .await?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        pmid: new.pmid,
        aspect: new.aspect,
        model: new.model,
        comment: new.comment,
    })
}

/// All comments attached to one document, oldest first
pub async fn list_comments_for_pmid(pool: &SqlitePool, pmid: &str) -> Result<Vec<Comment>> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, pmid, aspect, model, comment FROM comment WHERE pmid = ? ORDER BY id",
    )
    .bind(pmid)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Comment::from).collect())
}

/// All comments grouped by model, each group sorted by (pmid, aspect)
pub async fn list_comments_by_model(pool: &SqlitePool) -> Result<BTreeMap<String, Vec<Comment>>> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, pmid, aspect, model, comment FROM comment ORDER BY pmid, aspect, id",
    )
    .fetch_all(pool)
    .await?;

    let mut by_model: BTreeMap<String, Vec<Comment>> = BTreeMap::new();
    for comment in rows.into_iter().map(Comment::from) {
        by_model.entry(comment.model.clone()).or_default().push(comment);
    }

    Ok(by_model)
}

/// Delete one comment by id
///
/// Returns `Error::NotFound` when no row has that id.
pub async fn delete_comment(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM comment WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("comment {}", id)));
    }

    Ok(())
}
