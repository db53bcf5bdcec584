pub mod admin;
pub mod comment;
pub mod home;
pub mod images;
pub mod photo;
pub mod user;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// The full HTTP surface with its middleware stack.
pub fn app(state: AppState) -> Router {
    let max_upload = state.config.storage.max_upload_bytes;
    let cors = state.config.server.cors;

    let mut app = Router::new()
        .route("/", get(home::index))
        .merge(admin::router())
        .merge(user::router())
        .merge(photo::router())
        .merge(comment::router())
        .merge(images::router())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http());

    if cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".into())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
