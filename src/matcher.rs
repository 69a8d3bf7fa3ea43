// src/matcher.rs
//! Cross-source reconciliation: greedily pairs records from two feeds by
//! team-name similarity, then fuses each pair into one record.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;

use crate::record::EventRecord;
use crate::similarity::event_similarity;

/// Which side's positional fields (source identity, title, teams, time, date)
/// survive fusion. Links are always unioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuseAuthority {
    Left,
    Right,
}

/// Committed index pairs plus the leftovers on both sides.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PairingReport {
    pub pairs: Vec<(usize, usize)>,
    pub unmatched_left: Vec<usize>,
    pub unmatched_right: Vec<usize>,
}

/// Greedy best-first pairing: left records in order, each taking the
/// highest-scoring free right record (earliest index on ties, via the strict
/// comparison). A best score under `threshold` leaves the left record
/// unmatched.
pub fn pair_events(
    left: &[EventRecord],
    right: &[EventRecord],
    threshold: f64,
) -> PairingReport {
    let mut used_right = vec![false; right.len()];
    let mut report = PairingReport::default();

    for (li, l) in left.iter().enumerate() {
        let mut best_score = 0.0f64;
        let mut best_ri: Option<usize> = None;

        for (ri, r) in right.iter().enumerate() {
            if used_right[ri] {
                continue;
            }
            let score = event_similarity(
                (&l.team1.name, &l.team2.name),
                (&r.team1.name, &r.team2.name),
            );
            if score > best_score {
                best_score = score;
                best_ri = Some(ri);
            }
        }

        match best_ri {
            Some(ri) if best_score >= threshold => {
                used_right[ri] = true;
                report.pairs.push((li, ri));
                tracing::debug!(
                    left = %format!("{} vs {}", l.team1.name, l.team2.name),
                    right = %format!(
                        "{} vs {}",
                        right[ri].team1.name, right[ri].team2.name
                    ),
                    score = format!("{best_score:.2}"),
                    "paired"
                );
            }
            _ => report.unmatched_left.push(li),
        }
    }

    report.unmatched_right = used_right
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(ri, _)| ri)
        .collect();
    report
}

/// Union of two link lists with duplicates removed, order randomized so
/// neither feed's stream ordering is systematically favored.
pub fn union_shuffled(first: Vec<String>, second: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(first.len() + second.len());
    for url in first.into_iter().chain(second) {
        if seen.insert(url.clone()) {
            out.push(url);
        }
    }
    out.shuffle(&mut rand::rng());
    out
}

/// Fuse two per-source lists into one. Matched pairs collapse into a single
/// record carrying the authoritative side's fields and the shuffled union of
/// both link sets; everything unmatched passes through unchanged. Output
/// order: the left list's order first, then leftover right records in theirs.
pub fn fuse_sources(
    left: Vec<EventRecord>,
    right: Vec<EventRecord>,
    threshold: f64,
    authority: FuseAuthority,
) -> Vec<EventRecord> {
    let report = pair_events(&left, &right, threshold);
    let pair_of: HashMap<usize, usize> = report.pairs.iter().copied().collect();
    let mut right: Vec<Option<EventRecord>> = right.into_iter().map(Some).collect();

    let mut fused = Vec::with_capacity(left.len() + right.len());
    for (li, l) in left.into_iter().enumerate() {
        match pair_of.get(&li).and_then(|&ri| right[ri].take()) {
            Some(r) => fused.push(fuse_pair(l, r, authority)),
            None => fused.push(l),
        }
    }
    fused.extend(right.into_iter().flatten());
    fused
}

fn fuse_pair(left: EventRecord, right: EventRecord, authority: FuseAuthority) -> EventRecord {
    let (mut keeper, other) = match authority {
        FuseAuthority::Left => (left, right),
        FuseAuthority::Right => (right, left),
    };
    keeper.links = union_shuffled(keeper.links, other.links);
    keeper
}
