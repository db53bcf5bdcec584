//! Record access for users, photos, comments and replies.
//!
//! Every function takes a borrowed connection so handlers decide how long a
//! pooled connection is held. Author names are always joined in at read time.

pub mod comments;
pub mod photos;
pub mod users;

use chrono::{SecondsFormat, Utc};
use rusqlite::Row;

use crate::db::models::UserSummary;
use crate::error::AppError;

/// Current time in the stored format (RFC 3339, UTC, milliseconds).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Returns the trimmed text, or a 400 with `message` when nothing is left.
pub fn required_text<'a>(text: Option<&'a str>, message: &str) -> Result<&'a str, AppError> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

/// Reads a LEFT JOINed author starting at column `first`: id, first name, last name.
fn author_at(row: &Row<'_>, first: usize) -> rusqlite::Result<Option<UserSummary>> {
    let id: Option<String> = row.get(first)?;
    let first_name: Option<String> = row.get(first + 1)?;
    let last_name: Option<String> = row.get(first + 2)?;
    Ok(match (id, first_name, last_name) {
        (Some(id), Some(first_name), Some(last_name)) => Some(UserSummary {
            id,
            first_name,
            last_name,
        }),
        _ => None,
    })
}
