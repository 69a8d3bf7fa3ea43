// src/store.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::record::EventRecord;

/// Load the persisted collection. A missing file or unreadable document means
/// an empty collection; individually malformed array elements are logged and
/// skipped so one bad entry cannot take the whole store down.
pub fn load_events(path: &Path) -> Vec<EventRecord> {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = ?e, path = %path.display(), "could not read store");
            return Vec::new();
        }
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "store is not a JSON array, starting empty"
            );
            return Vec::new();
        }
    };

    let mut events = Vec::with_capacity(values.len());
    let mut skipped = 0usize;
    for value in values {
        match serde_json::from_value::<EventRecord>(value) {
            Ok(rec) => events.push(rec),
            Err(e) => {
                skipped += 1;
                tracing::warn!(error = %e, "skipping malformed store entry");
            }
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, total = events.len(), "store loaded with exclusions");
    }
    events
}

/// Rewrite the whole collection: pretty-printed JSON (UTF-8 kept verbatim),
/// serialized to a sibling `.tmp` file and renamed over the target, so a
/// failed write leaves the previous file intact.
pub fn save_events(path: &Path, events: &[EventRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(events).context("serializing store")?;
    let tmp = tmp_path(path);
    fs::write(&tmp, json.as_bytes()).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}
