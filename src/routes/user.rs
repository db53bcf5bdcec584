use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::db::models::{User, UserSummary};
use crate::error::AppResult;
use crate::extractors::ApiJson;
use crate::state::AppState;
use crate::store::users::{self, NewUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/user", post(register))
        .route("/api/user/list", get(list_users))
        .route("/api/user/{id}", get(get_user))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let user = {
        let conn = state.db.get()?;
        users::register(&conn, new_user)?
    };
    tracing::info!(user_id = %user.id, login_name = %user.login_name, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "_id": user.id, "login_name": user.login_name })),
    ))
}

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserSummary>>> {
    let conn = state.db.get()?;
    Ok(Json(users::list_summaries(&conn)?))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<User>> {
    let conn = state.db.get()?;
    Ok(Json(users::get_profile(&conn, &id)?))
}
