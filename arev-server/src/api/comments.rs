//! Reviewer comment endpoints
//!
//! - POST   /comments                 create
//! - GET    /comments/:pmid           list for one document
//! - DELETE /comments/:id             delete
//! - GET    /api/comments/by-model    all comments grouped by model

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use arev_common::db::{self, Comment, NewComment};

use super::{ApiError, ApiResult};
use crate::ingest::{normalize_identifier, RecordValue};
use crate::AppState;

/// Body of POST /comments
///
/// `pmid` may arrive as a string or a number; it is stored in canonical form.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub pmid: Value,
    pub aspect: String,
    pub model: String,
    pub comment: String,
}

/// Comment as returned to the front end
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub pmid: String,
    pub aspect: String,
    pub model: String,
    pub comment: String,
    /// Always "synced": anything read from the store is persisted
    #[serde(rename = "syncStatus")]
    pub sync_status: &'static str,
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            pmid: c.pmid,
            aspect: c.aspect,
            model: c.model,
            comment: c.comment,
            sync_status: "synced",
        }
    }
}

/// POST /comments
pub async fn add_comment(
    State(state): State<AppState>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<Json<CommentView>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let new = NewComment {
        pmid: normalize_identifier(&RecordValue::from(request.pmid)),
        aspect: request.aspect,
        model: request.model,
        comment: request.comment,
    };
    info!(
        "Adding comment: pmid={}, aspect={}, model={}",
        new.pmid, new.aspect, new.model
    );

    let stored = db::insert_comment(&state.db, new).await?;
    info!("Comment created with id {}", stored.id);

    Ok(Json(stored.into()))
}

/// GET /comments/:pmid
pub async fn get_comments(
    State(state): State<AppState>,
    Path(pmid): Path<String>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let comments = db::list_comments_for_pmid(&state.db, &pmid).await?;
    info!("Found {} comments for pmid {}", comments.len(), pmid);

    Ok(Json(comments.into_iter().map(CommentView::from).collect()))
}

/// DELETE /comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid comment ID".to_string()))?;

    match db::delete_comment(&state.db, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(arev_common::Error::NotFound(_)) => {
            Err(ApiError::NotFound("Comment not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/comments/by-model
pub async fn get_comments_by_model(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, Vec<CommentView>>>> {
    let by_model = db::list_comments_by_model(&state.db).await?;
    info!("Comments grouped by {} models", by_model.len());

    Ok(Json(
        by_model
            .into_iter()
            .map(|(model, comments)| {
                (model, comments.into_iter().map(CommentView::from).collect())
            })
            .collect(),
    ))
}
