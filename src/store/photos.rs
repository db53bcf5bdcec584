use rusqlite::{params, Connection, OptionalExtension};

use super::comments::comments_for_photo;
use super::{new_id, now_timestamp};
use crate::db::models::Photo;
use crate::error::{AppError, AppResult};

pub fn exists(conn: &Connection, photo_id: &str) -> AppResult<bool> {
    let found: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM photos WHERE id = ?1",
        params![photo_id],
        |r| r.get(0),
    )?;
    Ok(found)
}

/// Record an uploaded file as a new photo owned by `owner_id`.
pub fn create(conn: &Connection, owner_id: &str, file_name: &str) -> AppResult<Photo> {
    let photo = Photo {
        id: new_id(),
        user_id: owner_id.to_string(),
        file_name: file_name.to_string(),
        date_time: now_timestamp(),
        comments: Vec::new(),
    };
    conn.execute(
        "INSERT INTO photos (id, user_id, file_name, date_time) VALUES (?1, ?2, ?3, ?4)",
        params![photo.id, photo.user_id, photo.file_name, photo.date_time],
    )?;
    Ok(photo)
}

/// Every photo of a user, oldest first, each with its comment thread.
pub fn list_for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<Photo>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, file_name, date_time FROM photos
         WHERE user_id = ?1
         ORDER BY date_time ASC, rowid ASC",
    )?;
    let mut photos = stmt
        .query_map(params![user_id], |row| {
            Ok(Photo {
                id: row.get(0)?,
                user_id: row.get(1)?,
                file_name: row.get(2)?,
                date_time: row.get(3)?,
                comments: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for photo in &mut photos {
        photo.comments = comments_for_photo(conn, &photo.id)?;
    }
    Ok(photos)
}

/// Delete a photo record. Only its owner may delete it; comments and replies
/// cascade, the file on disk is left in place.
pub fn delete(conn: &Connection, photo_id: &str, requester_id: &str) -> AppResult<()> {
    let owner_id: String = conn
        .query_row(
            "SELECT user_id FROM photos WHERE id = ?1",
            params![photo_id],
            |r| r.get(0),
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound("Photo not found".into()))?;

    if owner_id != requester_id {
        return Err(AppError::Unauthorized);
    }

    conn.execute("DELETE FROM photos WHERE id = ?1", params![photo_id])?;
    Ok(())
}
