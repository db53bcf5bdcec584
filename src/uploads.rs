//! The on-disk image area. Files are written once under generated names and
//! served back verbatim; nothing here ever deletes.

use std::path::{Path, PathBuf};

const MAX_EXTENSION_LEN: usize = 8;

/// Lowercased extension of a client-supplied file name, if it is plain ASCII alphanumerics.
fn sanitize_extension(original: &str) -> Option<String> {
    let ext = Path::new(original).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Generated storage name: a fresh UUID plus the sanitized client extension.
pub fn stored_file_name(original: Option<&str>) -> String {
    let id = uuid::Uuid::now_v7();
    match original.and_then(sanitize_extension) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

/// Write `bytes` into `dir` and return the generated file name.
pub async fn save(dir: &Path, original: Option<&str>, bytes: &[u8]) -> std::io::Result<String> {
    tokio::fs::create_dir_all(dir).await?;
    let file_name = stored_file_name(original);
    tokio::fs::write(dir.join(&file_name), bytes).await?;
    tracing::info!(file_name = %file_name, size = bytes.len(), "Stored upload");
    Ok(file_name)
}

/// Map a requested file name to a path inside `dir`, refusing anything that
/// could escape it.
pub fn resolve(dir: &Path, file_name: &str) -> Option<PathBuf> {
    if file_name.is_empty()
        || file_name.starts_with('.')
        || file_name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
    {
        return None;
    }
    Some(dir.join(file_name))
}
