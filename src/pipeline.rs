// src/pipeline.rs
//! One aggregation cycle: fetch every enabled source, reconcile the feeds
//! against each other, merge the result into the stored collection, save.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::config::AppConfig;
use crate::ingest::types::SourceProvider;
use crate::matcher::{fuse_sources, FuseAuthority};
use crate::merge::{merge_into_collection, MergeStats};
use crate::record::EventRecord;
use crate::store;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("fetch_events_total", "Total events parsed from providers.");
        describe_counter!("fetch_provider_errors_total", "Provider fetch/parse errors.");
        describe_counter!("merge_added_total", "Events newly added to the collection.");
        describe_counter!(
            "merge_updated_total",
            "Stored events refreshed by a fetched event."
        );
        describe_counter!("retention_removed_total", "Stored events dropped as expired.");
        describe_counter!(
            "retention_kept_unresolved_total",
            "Stored events kept because their kickoff could not be read."
        );
        describe_histogram!("fetch_parse_ms", "Provider parse time in milliseconds.");
        describe_gauge!(
            "collection_size",
            "Events in the stored collection after the last cycle."
        );
        describe_gauge!("aggregator_last_run_ts", "Unix ts when the last cycle finished.");
    });
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub fetched: usize,
    pub reconciled: usize,
    pub merge: MergeStats,
    pub total: usize,
}

/// Fetch every provider and reconcile the feeds into one list. A failing
/// provider degrades the cycle to the remaining sources. Earlier providers
/// are authoritative when feeds describe the same event.
pub async fn collect_sources(
    providers: &[Box<dyn SourceProvider>],
    cfg: &AppConfig,
    report: &mut CycleReport,
) -> Vec<EventRecord> {
    let mut feeds: Vec<Vec<EventRecord>> = Vec::new();
    for p in providers {
        match p.fetch_latest().await {
            Ok(v) => {
                tracing::info!(provider = p.name(), events = v.len(), "source fetched");
                report.sources_ok += 1;
                report.fetched += v.len();
                feeds.push(v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("fetch_provider_errors_total").increment(1);
                report.sources_failed += 1;
            }
        }
    }

    let mut feeds = feeds.into_iter();
    let Some(first) = feeds.next() else {
        return Vec::new();
    };
    feeds.fold(first, |acc, next| {
        if cfg.cross_source_matching {
            fuse_sources(acc, next, cfg.similarity_threshold, FuseAuthority::Left)
        } else {
            let mut acc = acc;
            acc.extend(next);
            acc
        }
    })
}

/// Run one cycle against the collection stored at `cfg.output_file`.
pub async fn run_cycle(
    cfg: &AppConfig,
    providers: &[Box<dyn SourceProvider>],
    now: DateTime<Utc>,
) -> Result<CycleReport> {
    ensure_metrics_described();
    let mut report = CycleReport::default();

    let mut fresh = collect_sources(providers, cfg, &mut report).await;
    let before = fresh.len();
    fresh.retain(|r| r.has_valid_teams() && !r.links.is_empty());
    if fresh.len() < before {
        tracing::warn!(
            dropped = before - fresh.len(),
            "dropped records with invalid teams or no links before merge"
        );
    }
    report.reconciled = fresh.len();

    let persisted = store::load_events(&cfg.output_file);
    let (collection, stats) = merge_into_collection(
        fresh,
        persisted,
        now,
        cfg.retention_hours,
        &cfg.default_logo_url,
    );
    report.merge = stats;
    report.total = collection.len();

    store::save_events(&cfg.output_file, &collection)
        .with_context(|| format!("saving collection to {}", cfg.output_file.display()))?;

    counter!("merge_added_total").increment(stats.added as u64);
    counter!("merge_updated_total").increment(stats.updated as u64);
    counter!("retention_removed_total").increment(stats.retention.removed as u64);
    counter!("retention_kept_unresolved_total").increment(stats.retention.kept_unresolved as u64);
    gauge!("collection_size").set(report.total as f64);
    gauge!("aggregator_last_run_ts").set(now.timestamp() as f64);

    tracing::info!(
        sources_ok = report.sources_ok,
        sources_failed = report.sources_failed,
        fetched = report.fetched,
        reconciled = report.reconciled,
        added = stats.added,
        updated = stats.updated,
        carried = stats.carried,
        expired = stats.retention.removed,
        total = report.total,
        "cycle complete"
    );
    Ok(report)
}
