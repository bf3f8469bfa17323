//! Best-effort file storage shared by the built-in handlers.
//!
//! Handlers keep their state in plain files: JSONL logs (one record per
//! line, appended) and small JSON documents (replaced atomically via a
//! temp file and rename). Concurrent runner processes may interleave
//! appends; records are written with a single `write_all` per line.

use std::path::{Path, PathBuf};

use relay_core::Result;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;

/// RFC 3339 timestamp for records.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Make an identifier safe to use as a file name component.
pub fn file_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Session-scoped file path: `<dir>/<session>.<ext>`.
pub fn session_file(dir: &Path, session_id: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}.{ext}", file_component(session_id)))
}

/// Append one JSON record as a line.
pub async fn append_jsonl(path: &Path, record: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}

/// Read a JSON document; `None` when the file does not exist.
pub async fn read_json(path: &Path) -> Result<Option<Value>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write a JSON document atomically.
pub async fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(value)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Increment `counts[key]` in the counter document at `path`.
///
/// Returns the new count. A corrupt document is replaced.
pub async fn increment_counter(path: &Path, key: &str) -> Result<u64> {
    let mut doc = match read_json(path).await {
        Ok(Some(Value::Object(map))) => map,
        Ok(_) | Err(_) => Map::new(),
    };

    let counts = doc
        .entry("counts")
        .or_insert_with(|| Value::Object(Map::new()));
    if !counts.is_object() {
        *counts = Value::Object(Map::new());
    }
    let next = counts.get(key).and_then(Value::as_u64).unwrap_or(0) + 1;
    if let Value::Object(map) = counts {
        let _ = map.insert(key.to_string(), Value::from(next));
    }
    let _ = doc.insert("updatedAt".to_string(), Value::String(timestamp()));

    write_json(path, &Value::Object(doc)).await?;
    Ok(next)
}

/// Truncate to at most `max` characters, marking the cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}
