use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::{Comment, Reply};
use crate::error::AppResult;
use crate::extractors::{ApiJson, CurrentUser};
use crate::state::AppState;
use crate::store::comments;

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub comment: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/comment/commentsOfPhoto/{photo_id}",
            get(list_comments).post(add_comment),
        )
        .route(
            "/api/comment/commentsOfPhoto/{photo_id}/{comment_id}/reply",
            post(add_reply),
        )
}

async fn list_comments(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(photo_id): Path<String>,
) -> AppResult<Json<Vec<Comment>>> {
    let conn = state.db.get()?;
    Ok(Json(comments::list_comments(&conn, &photo_id)?))
}

async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(photo_id): Path<String>,
    ApiJson(body): ApiJson<CommentBody>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let conn = state.db.get()?;
    let comment = comments::add_comment(&conn, &photo_id, &user.id, body.comment.as_deref())?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn add_reply(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((photo_id, comment_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<CommentBody>,
) -> AppResult<(StatusCode, Json<Reply>)> {
    let conn = state.db.get()?;
    let reply = comments::add_reply(
        &conn,
        &photo_id,
        &comment_id,
        &user.id,
        body.comment.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(reply)))
}
