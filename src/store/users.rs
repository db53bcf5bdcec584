use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde::Deserialize;

use crate::db::models::{User, UserSummary};
use crate::error::{AppError, AppResult};

const LOGIN_NAME_TAKEN: &str = "Login name already exists.";

/// Registration payload. Every field is optional so absence can be reported
/// as a validation error instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct NewUser {
    #[serde(alias = "loginName")]
    pub login_name: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub occupation: Option<String>,
}

const USER_COLUMNS: &str =
    "id, login_name, password, first_name, last_name, location, description, occupation";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        login_name: row.get(1)?,
        password: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        location: row.get(5)?,
        description: row.get(6)?,
        occupation: row.get(7)?,
    })
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Create a user. The password is stored exactly as given.
pub fn register(conn: &Connection, new_user: NewUser) -> AppResult<User> {
    let (Some(login_name), Some(password), Some(first_name), Some(last_name)) = (
        present(new_user.login_name),
        present(new_user.password),
        present(new_user.first_name),
        present(new_user.last_name),
    ) else {
        return Err(AppError::BadRequest(
            "Required fields are missing (login_name, password, first_name, last_name).".into(),
        ));
    };

    if find_by_login_name(conn, &login_name)?.is_some() {
        return Err(AppError::Conflict(LOGIN_NAME_TAKEN.into()));
    }

    let user = User {
        id: super::new_id(),
        login_name,
        password,
        first_name,
        last_name,
        location: present(new_user.location),
        description: present(new_user.description),
        occupation: present(new_user.occupation),
    };

    let inserted = conn.execute(
        "INSERT INTO users (id, login_name, password, first_name, last_name, location, description, occupation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.login_name,
            user.password,
            user.first_name,
            user.last_name,
            user.location,
            user.description,
            user.occupation
        ],
    );

    match inserted {
        Ok(_) => Ok(user),
        // A concurrent registration won the UNIQUE(login_name) race.
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(AppError::Conflict(LOGIN_NAME_TAKEN.into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_login_name(conn: &Connection, login_name: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE login_name = ?1", USER_COLUMNS),
            params![login_name],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get(conn: &Connection, id: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// Look up a user for the public profile endpoint: malformed and unknown ids are both 400s.
pub fn get_profile(conn: &Connection, id: &str) -> AppResult<User> {
    if uuid::Uuid::parse_str(id).is_err() {
        return Err(AppError::BadRequest("Invalid user ID".into()));
    }
    get(conn, id)?.ok_or_else(|| AppError::BadRequest("User not found".into()))
}

/// All users' display fields in registration order.
pub fn list_summaries(conn: &Connection) -> AppResult<Vec<UserSummary>> {
    let mut stmt =
        conn.prepare("SELECT id, first_name, last_name FROM users ORDER BY rowid ASC")?;
    let users = stmt
        .query_map([], |row| {
            Ok(UserSummary {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}
