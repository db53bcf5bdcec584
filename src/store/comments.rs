use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{author_at, new_id, now_timestamp, photos, required_text};
use crate::db::models::{Comment, Reply};
use crate::error::{AppError, AppResult};

fn photo_not_found() -> AppError {
    AppError::NotFound("Photo not found".into())
}

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".into())
}

/// Append a comment to a photo and return it with its author resolved.
///
/// The next position is computed inside the INSERT, so concurrent appends to
/// the same photo are serialized by SQLite rather than racing a read.
pub fn add_comment(
    conn: &Connection,
    photo_id: &str,
    author_id: &str,
    text: Option<&str>,
) -> AppResult<Comment> {
    let text = required_text(text, "Comment text cannot be empty")?;
    let id = new_id();

    let inserted = conn.execute(
        "INSERT INTO comments (id, photo_id, user_id, comment, date_time, position)
         SELECT ?1, p.id, ?3, ?4, ?5,
                COALESCE((SELECT MAX(c.position) + 1 FROM comments c WHERE c.photo_id = p.id), 0)
         FROM photos p WHERE p.id = ?2",
        params![id, photo_id, author_id, text, now_timestamp()],
    )?;
    if inserted == 0 {
        return Err(photo_not_found());
    }

    tracing::debug!(photo_id, comment_id = %id, "Comment added");
    load_comment(conn, &id)?
        .ok_or_else(|| AppError::Internal(format!("comment {} vanished after insert", id)))
}

/// Append a reply to a comment of the given photo.
///
/// A comment id that exists but belongs to another photo is `Comment not found`.
pub fn add_reply(
    conn: &Connection,
    photo_id: &str,
    comment_id: &str,
    author_id: &str,
    text: Option<&str>,
) -> AppResult<Reply> {
    let text = required_text(text, "Reply text cannot be empty")?;
    if !photos::exists(conn, photo_id)? {
        return Err(photo_not_found());
    }

    let id = new_id();
    let inserted = conn.execute(
        "INSERT INTO replies (id, comment_id, user_id, comment, date_time, position)
         SELECT ?1, c.id, ?4, ?5, ?6,
                COALESCE((SELECT MAX(r.position) + 1 FROM replies r WHERE r.comment_id = c.id), 0)
         FROM comments c WHERE c.id = ?2 AND c.photo_id = ?3",
        params![id, comment_id, photo_id, author_id, text, now_timestamp()],
    )?;
    if inserted == 0 {
        return Err(comment_not_found());
    }

    tracing::debug!(photo_id, comment_id, reply_id = %id, "Reply added");
    load_reply(conn, &id)?
        .ok_or_else(|| AppError::Internal(format!("reply {} vanished after insert", id)))
}

/// Every comment of a photo in insertion order, replies and authors resolved.
pub fn list_comments(conn: &Connection, photo_id: &str) -> AppResult<Vec<Comment>> {
    if !photos::exists(conn, photo_id)? {
        return Err(photo_not_found());
    }
    comments_for_photo(conn, photo_id)
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        comment: row.get(1)?,
        date_time: row.get(2)?,
        user: author_at(row, 3)?,
        replies: Vec::new(),
    })
}

fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: row.get(0)?,
        comment: row.get(1)?,
        date_time: row.get(2)?,
        user: author_at(row, 3)?,
    })
}

/// Comments of one photo without the existence check. Used by photo listings too.
pub(crate) fn comments_for_photo(conn: &Connection, photo_id: &str) -> AppResult<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.comment, c.date_time, u.id, u.first_name, u.last_name
         FROM comments c
         LEFT JOIN users u ON u.id = c.user_id
         WHERE c.photo_id = ?1
         ORDER BY c.position ASC",
    )?;
    let mut comments = stmt
        .query_map(params![photo_id], comment_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT r.id, r.comment, r.date_time, u.id, u.first_name, u.last_name, r.comment_id
         FROM replies r
         JOIN comments c ON c.id = r.comment_id
         LEFT JOIN users u ON u.id = r.user_id
         WHERE c.photo_id = ?1
         ORDER BY r.comment_id, r.position ASC",
    )?;
    let mut replies: HashMap<String, Vec<Reply>> = HashMap::new();
    let rows = stmt.query_map(params![photo_id], |row| {
        Ok((row.get::<_, String>(6)?, reply_from_row(row)?))
    })?;
    for row in rows {
        let (comment_id, reply) = row?;
        replies.entry(comment_id).or_default().push(reply);
    }

    for comment in &mut comments {
        if let Some(thread) = replies.remove(&comment.id) {
            comment.replies = thread;
        }
    }
    Ok(comments)
}

fn load_comment(conn: &Connection, comment_id: &str) -> AppResult<Option<Comment>> {
    let comment = conn
        .query_row(
            "SELECT c.id, c.comment, c.date_time, u.id, u.first_name, u.last_name
             FROM comments c
             LEFT JOIN users u ON u.id = c.user_id
             WHERE c.id = ?1",
            params![comment_id],
            comment_from_row,
        )
        .optional()?;
    Ok(comment)
}

fn load_reply(conn: &Connection, reply_id: &str) -> AppResult<Option<Reply>> {
    let reply = conn
        .query_row(
            "SELECT r.id, r.comment, r.date_time, u.id, u.first_name, u.last_name
             FROM replies r
             LEFT JOIN users u ON u.id = r.user_id
             WHERE r.id = ?1",
            params![reply_id],
            reply_from_row,
        )
        .optional()?;
    Ok(reply)
}
