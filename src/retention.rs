// src/retention.rs
//! Age-based expiry of persisted records, measured from kickoff.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::record::{EventRecord, NOT_FOUND};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetentionStats {
    pub removed: usize,
    /// Records kept because no kickoff instant could be resolved. These never
    /// expire on their own, so the count is surfaced in cycle telemetry.
    pub kept_unresolved: usize,
}

/// Absolute kickoff for a record: the epoch field when present, otherwise the
/// parsed `date`+`time` strings. `None` when neither resolves.
fn kickoff_instant(record: &EventRecord) -> Option<NaiveDateTime> {
    if let Some(ms) = record.kickoff_ms {
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc());
    }
    if record.date == NOT_FOUND || record.time == NOT_FOUND {
        return None;
    }
    NaiveDateTime::parse_from_str(
        &format!("{} {}", record.date, record.time),
        "%d-%m-%Y %H:%M",
    )
    .ok()
}

/// Keep every record whose kickoff is within `window_hours` of `now`. A record
/// is removed only when its kickoff is strictly older than the window; one
/// with no resolvable kickoff is retained (fail open).
pub fn clean_expired(
    events: Vec<EventRecord>,
    now: DateTime<Utc>,
    window_hours: i64,
) -> (Vec<EventRecord>, RetentionStats) {
    let cutoff = now.naive_utc() - Duration::hours(window_hours);
    let mut stats = RetentionStats::default();
    let mut kept = Vec::with_capacity(events.len());

    for record in events {
        match kickoff_instant(&record) {
            Some(kickoff) if kickoff < cutoff => {
                stats.removed += 1;
                tracing::debug!(
                    team1 = %record.team1.name,
                    team2 = %record.team2.name,
                    date = %record.date,
                    "expired past retention window"
                );
            }
            Some(_) => kept.push(record),
            None => {
                stats.kept_unresolved += 1;
                tracing::debug!(
                    team1 = %record.team1.name,
                    team2 = %record.team2.name,
                    date = %record.date,
                    time = %record.time,
                    "kickoff unresolved, keeping"
                );
                kept.push(record);
            }
        }
    }

    (kept, stats)
}
