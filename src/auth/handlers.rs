use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rusqlite::Connection;
use serde::Deserialize;

use crate::auth::session;
use crate::db::models::{User, UserSummary};
use crate::error::{AppError, AppResult};
use crate::extractors::ApiJson;
use crate::state::AppState;
use crate::store::users;

const INVALID_CREDENTIALS: &str = "Invalid login name or password";

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "loginName")]
    pub login_name: Option<String>,
    pub password: Option<String>,
}

/// Check a login name and password against the user store.
///
/// Passwords are compared verbatim: stored records hold plain text, so
/// hashing here would lock out every existing account. Unknown login names
/// and wrong passwords fail identically.
pub fn authenticate(conn: &Connection, login_name: &str, password: &str) -> AppResult<User> {
    match users::find_by_login_name(conn, login_name)? {
        Some(user) if user.password == password => Ok(user),
        _ => Err(AppError::BadRequest(INVALID_CREDENTIALS.into())),
    }
}

/// Both fields must be present and non-blank. Values pass through untrimmed
/// so the password is checked exactly as stored.
fn login_inputs(req: LoginRequest) -> AppResult<(String, String)> {
    let filled = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    match (filled(req.login_name), filled(req.password)) {
        (Some(login_name), Some(password)) => Ok((login_name, password)),
        _ => Err(AppError::BadRequest(
            "Login name and password are required".into(),
        )),
    }
}

/// POST /admin/login: verify credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Response> {
    let (login_name, password) = login_inputs(req)?;

    let (user, token) = {
        let conn = state.db.get()?;
        let user = authenticate(&conn, &login_name, &password)?;
        let token = session::create_session(&conn, &user.id, state.config.auth.session_hours)?;
        (user, token)
    };
    tracing::info!(user_id = %user.id, "User logged in");

    let cookie = session::session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );
    let body = UserSummary {
        id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /admin/logout: delete the caller's session
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let cookie_name = &state.config.auth.cookie_name;
    let no_session = || AppError::BadRequest("No user is currently logged in".into());

    let token = session::get_cookie_value(&headers, cookie_name).ok_or_else(no_session)?;
    let deleted = {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?
    };
    if !deleted {
        return Err(no_session());
    }

    Ok((
        [(header::SET_COOKIE, session::clear_session_cookie(cookie_name))],
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    )
        .into_response())
}
