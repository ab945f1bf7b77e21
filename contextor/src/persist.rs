//! Query artifacts: `{root}/{collection}/{label}_chunks/{k}_docs/{unix_ts}/`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

pub const QUERY_FILE: &str = "query.txt";
pub const RESPONSE_FILE: &str = "response.txt";

/// Parent directory shared by every run with the same collection, label and K.
pub fn artifact_parent(root: &Path, collection: &str, chunk_label: &str, top_k: usize) -> PathBuf {
    root.join(collection)
        .join(format!("{chunk_label}_chunks"))
        .join(format!("{top_k}_docs"))
}

/// Creates a fresh directory named `{timestamp}`, or `{timestamp}_N` when a
/// run in the same second already took it.
pub fn create_unique_dir(parent: &Path, timestamp: i64) -> std::io::Result<PathBuf> {
    fs::create_dir_all(parent)?;
    let mut n = 0u32;
    loop {
        let name = if n == 0 {
            timestamp.to_string()
        } else {
            format!("{timestamp}_{n}")
        };
        let dir = parent.join(name);
        match fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Writes the prompt and the reply side by side; returns the directory used.
pub fn save_exchange(
    parent: &Path,
    timestamp: i64,
    prompt: &str,
    response: &str,
) -> std::io::Result<PathBuf> {
    let dir = create_unique_dir(parent, timestamp)?;
    fs::write(dir.join(QUERY_FILE), prompt)?;
    fs::write(dir.join(RESPONSE_FILE), response)?;
    debug!("saved query artifacts to {}", dir.display());
    Ok(dir)
}
