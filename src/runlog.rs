// src/runlog.rs
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime};
use once_cell::sync::OnceCell;
use rand::Rng;
use regex::Regex;

const HEX_UPPER: &[u8] = b"0123456789ABCDEF";

/// Per-cycle identifier stamped into every log line via the cycle span:
/// `FETCH-YYYYmmdd-HHMMSS-XXXXXXXX`.
pub fn generate_run_code() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..8)
        .map(|_| HEX_UPPER[rng.random_range(0..HEX_UPPER.len())] as char)
        .collect();
    format!("FETCH-{}-{}", Local::now().format("%Y%m%d-%H%M%S"), suffix)
}

/// Drop log lines whose leading timestamp (`YYYY-MM-DD HH:MM:SS`, space or
/// `T` separated, subseconds ignored) is older than `max_age_hours` before
/// `now`. Lines without a parseable stamp are kept. The file is rewritten
/// only when at least one line was dropped. Returns the dropped count.
pub fn trim_log_file(path: &Path, now: NaiveDateTime, max_age_hours: i64) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cutoff = now - Duration::hours(max_age_hours);

    static RE_STAMP: OnceCell<Regex> = OnceCell::new();
    let re = RE_STAMP
        .get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})[T ](\d{2}:\d{2}:\d{2})").unwrap());

    let mut kept: Vec<&str> = Vec::new();
    let mut removed = 0usize;
    for line in content.lines() {
        let stale = re
            .captures(line)
            .and_then(|caps| {
                NaiveDateTime::parse_from_str(
                    &format!("{} {}", &caps[1], &caps[2]),
                    "%Y-%m-%d %H:%M:%S",
                )
                .ok()
            })
            .is_some_and(|stamp| stamp < cutoff);
        if stale {
            removed += 1;
        } else {
            kept.push(line);
        }
    }

    if removed > 0 {
        let mut body = kept.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        fs::write(path, body).with_context(|| format!("rewriting {}", path.display()))?;
    }
    Ok(removed)
}
