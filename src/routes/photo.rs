use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::db::models::Photo;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::store::{photos, users};
use crate::uploads;

/// Multipart field carrying the image.
const PHOTO_FIELD: &str = "photo";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/photo/photosOfUser/{user_id}", get(photos_of_user))
        .route("/api/photo/photos/new", post(upload_photo))
        .route("/api/photo/photos/{photo_id}", delete(delete_photo))
}

async fn photos_of_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Photo>>> {
    let conn = state.db.get()?;
    let owner = users::get_profile(&conn, &user_id)?;
    Ok(Json(photos::list_for_user(&conn, &owner.id)?))
}

async fn upload_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<Photo>)> {
    let no_file = || AppError::BadRequest("No file provided".into());
    let mut multipart = multipart.map_err(|_| no_file())?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(PHOTO_FIELD) {
            let original_name = field.file_name().map(str::to_string);
            let data = field.bytes().await?;
            upload = Some((original_name, data));
            break;
        }
    }
    let (original_name, data) = upload
        .filter(|(_, data)| !data.is_empty())
        .ok_or_else(no_file)?;

    let file_name =
        uploads::save(&state.config.uploads_path(), original_name.as_deref(), &data).await?;
    let photo = {
        let conn = state.db.get()?;
        photos::create(&conn, &user.id, &file_name)?
    };
    tracing::info!(photo_id = %photo.id, user_id = %user.id, "Photo uploaded");

    Ok((StatusCode::CREATED, Json(photo)))
}

async fn delete_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(photo_id): Path<String>,
) -> AppResult<Json<Value>> {
    {
        let conn = state.db.get()?;
        photos::delete(&conn, &photo_id, &user.id)?;
    }
    tracing::info!(photo_id = %photo_id, user_id = %user.id, "Photo deleted");
    Ok(Json(json!({ "message": "Photo deleted successfully" })))
}
