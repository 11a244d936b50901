//! Newline-delimited JSON records and the binary task snapshot.
//!
//! Every record file holds one JSON object per line. Readers skip lines
//! that do not parse so a single bad line never hides the rest of the file.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AdmError, Result};
use crate::models::Task;

const SNAPSHOT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u8,
    tasks: Vec<Task>,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| AdmError::io(parent, e))?;
        }
    }
    Ok(())
}

/// Loads every well-formed record from `path`.
///
/// Returns an empty vector if the file does not exist.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let f = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| AdmError::io(path, e))?;
    let mut records = Vec::new();
    for (n, line) in BufReader::new(f).lines().enumerate() {
        let line = line.map_err(|e| AdmError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(r) => records.push(r),
            Err(e) => log::warn!("Skipping malformed line {} in {}: {}", n + 1, path.display(), e),
        }
    }
    Ok(records)
}

/// Appends a single record as a new line.
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    ensure_parent(path)?;
    let line = serde_json::to_string(record).map_err(|e| AdmError::Record {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AdmError::io(path, e))?;
    writeln!(f, "{}", line).map_err(|e| AdmError::io(path, e))
}

/// Rewrites the whole file with the given records, in order.
pub fn save_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut out = String::new();
    for r in records {
        let line = serde_json::to_string(r).map_err(|e| AdmError::Record {
            path: path.to_path_buf(),
            source: e,
        })?;
        out.push_str(&line);
        out.push('\n');
    }
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| AdmError::io(path, e))?;
    f.write_all(out.as_bytes()).map_err(|e| AdmError::io(path, e))
}

/// Writes the task list as a compact binary snapshot.
pub fn save_snapshot(path: &Path, tasks: &[Task]) -> Result<()> {
    ensure_parent(path)?;
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        tasks: tasks.to_vec(),
    };
    let bytes = postcard::to_allocvec(&snapshot).map_err(|e| AdmError::Snapshot {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, bytes).map_err(|e| AdmError::io(path, e))
}

/// Reads a snapshot written by [`save_snapshot`].
pub fn load_snapshot(path: &Path) -> Result<Vec<Task>> {
    let bytes = fs::read(path).map_err(|e| AdmError::io(path, e))?;
    let snapshot: Snapshot = postcard::from_bytes(&bytes).map_err(|e| AdmError::Snapshot {
        path: path.to_path_buf(),
        source: e,
    })?;
    if snapshot.version != SNAPSHOT_VERSION {
        log::warn!(
            "Snapshot {} has version {}, expected {}",
            path.display(),
            snapshot.version,
            SNAPSHOT_VERSION
        );
    }
    Ok(snapshot.tasks)
}
