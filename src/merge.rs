// src/merge.rs
//! # Incremental Merge Engine
//! Pure upsert of a freshly fetched batch into the persisted collection.
//! No I/O; callers hand in both lists plus `now`, making every path
//! unit-testable offline.
//!
//! Policy: the persisted side is cleaned first so stale entries never block
//! identity slots; a fresh record either claims its slot (enriching logos and
//! growing the link set) or is inserted new; unclaimed slots are carried
//! through unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::keyer::{derive_match_id, IdentityKey};
use crate::matcher::union_shuffled;
use crate::record::EventRecord;
use crate::retention::{clean_expired, RetentionStats};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// Fresh records inserted under a previously unseen identity.
    pub added: usize,
    /// Existing records enriched (logo filled in or link set grown).
    pub updated: usize,
    /// Persisted records carried through with no fresh counterpart.
    pub carried: usize,
    pub retention: RetentionStats,
}

/// Upsert `fresh` into `persisted` and return the new collection.
///
/// Every persisted identity either survives (possibly enriched) or is dropped
/// by retention; the output never holds two records with the same identity
/// key.
pub fn merge_into_collection(
    fresh: Vec<EventRecord>,
    persisted: Vec<EventRecord>,
    now: DateTime<Utc>,
    retention_hours: i64,
    placeholder_logo: &str,
) -> (Vec<EventRecord>, MergeStats) {
    let (cleaned, retention) = clean_expired(persisted, now, retention_hours);
    let mut stats = MergeStats {
        retention,
        ..MergeStats::default()
    };

    // Slot map over the cleaned collection, insertion order preserved so the
    // unclaimed remainder appends in its persisted order.
    let mut slots: Vec<Option<EventRecord>> = Vec::with_capacity(cleaned.len());
    let mut lookup: HashMap<IdentityKey, usize> = HashMap::with_capacity(cleaned.len());
    for record in cleaned {
        if record.source_name.trim().is_empty() {
            tracing::warn!(
                team1 = %record.team1.name,
                team2 = %record.team2.name,
                date = %record.date,
                "persisted record has no source_name, retiring legacy entry"
            );
            continue;
        }
        let key = IdentityKey::of(&record);
        let idx = slots.len();
        slots.push(Some(record));
        if let Some(prev) = lookup.insert(key, idx) {
            tracing::warn!("duplicate persisted identity, keeping the later record");
            slots[prev] = None;
        }
    }

    let mut out: Vec<EventRecord> = Vec::with_capacity(slots.len() + fresh.len());
    let mut out_index: HashMap<IdentityKey, usize> = HashMap::new();

    for new_record in fresh {
        let key = IdentityKey::of(&new_record);

        // A duplicate identity inside one batch folds into the record already
        // emitted this cycle, same enrichment rules as a persisted claim.
        if let Some(&oi) = out_index.get(&key) {
            if enrich(&mut out[oi], new_record, placeholder_logo) {
                stats.updated += 1;
            }
            continue;
        }

        match lookup.remove(&key).and_then(|idx| slots[idx].take()) {
            Some(mut existing) => {
                let changed = enrich(&mut existing, new_record, placeholder_logo);
                if changed {
                    stats.updated += 1;
                    tracing::info!(
                        team1 = %existing.team1.name,
                        team2 = %existing.team2.name,
                        "updated existing entry"
                    );
                }
                if existing.match_id.is_empty() {
                    existing.match_id = derived_id(&existing);
                }
                out_index.insert(key, out.len());
                out.push(existing);
            }
            None => {
                let mut record = new_record;
                if record.match_id.is_empty() {
                    record.match_id = derived_id(&record);
                }
                stats.added += 1;
                tracing::info!(
                    team1 = %record.team1.name,
                    team2 = %record.team2.name,
                    source = %record.source_name,
                    "new entry"
                );
                out_index.insert(key, out.len());
                out.push(record);
            }
        }
    }

    // Persisted records nothing refreshed this cycle.
    for remaining in slots.into_iter().flatten() {
        stats.carried += 1;
        out.push(remaining);
    }

    (out, stats)
}

fn derived_id(record: &EventRecord) -> String {
    derive_match_id(
        &record.source_name,
        &record.team1.name,
        &record.team2.name,
        &record.date,
        &record.time,
    )
}

/// Apply the enrichment rules to `existing` in place. Returns whether
/// anything changed: a placeholder logo was replaced by a real one, or the
/// link union came out a strict superset (in which case it replaces the list,
/// reshuffled). Links are otherwise left untouched, original order included.
fn enrich(existing: &mut EventRecord, new_record: EventRecord, placeholder_logo: &str) -> bool {
    let mut changed = false;

    if existing.team1.logo_url == placeholder_logo && new_record.team1.logo_url != placeholder_logo
    {
        existing.team1.logo_url = new_record.team1.logo_url;
        changed = true;
    }
    if existing.team2.logo_url == placeholder_logo && new_record.team2.logo_url != placeholder_logo
    {
        existing.team2.logo_url = new_record.team2.logo_url;
        changed = true;
    }

    let union = union_shuffled(existing.links.clone(), new_record.links);
    if union.len() > existing.links.len() {
        existing.links = union;
        changed = true;
    }

    changed
}
