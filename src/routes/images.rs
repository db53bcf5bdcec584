use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::uploads;

pub fn router() -> Router<AppState> {
    Router::new().route("/images/{file_name}", get(serve))
}

async fn serve(State(state): State<AppState>, Path(file_name): Path<String>) -> AppResult<Response> {
    let not_found = || AppError::NotFound("Image not found".into());
    let path = uploads::resolve(&state.config.uploads_path(), &file_name).ok_or_else(not_found)?;

    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(e.into()),
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        data,
    )
        .into_response())
}
