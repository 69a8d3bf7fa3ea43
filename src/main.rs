//! Matchday Aggregator — Binary Entrypoint
//! One invocation runs one cycle: fetch the enabled sources, reconcile the
//! feeds, merge into the stored collection, save, trim the run log.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::Instrument;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use matchday_aggregator::config::{AppConfig, LoadOutcome};
use matchday_aggregator::ingest::providers::{ScheduleProvider, StreamedProvider};
use matchday_aggregator::ingest::types::SourceProvider;
use matchday_aggregator::{pipeline, runlog};

/// Console logging, optionally teed into the run log file so old lines can
/// be trimmed by age on the next start.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating log dir {}", parent.display()))?;
                }
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_ansi(false)
                        .with_writer(std::io::stdout.and(Mutex::new(file))),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_ansi(false))
                .init();
        }
    }
    Ok(())
}

fn build_providers(cfg: &AppConfig) -> Result<Vec<Box<dyn SourceProvider>>> {
    let timeout = Duration::from_secs(cfg.request_timeout_secs);
    let delay = Duration::from_millis(cfg.stream_fetch_delay_ms);

    let mut providers: Vec<Box<dyn SourceProvider>> = Vec::new();
    if cfg.streamed.enabled {
        providers.push(Box::new(StreamedProvider::from_config(
            &cfg.streamed,
            timeout,
            delay,
            &cfg.default_logo_url,
        )?));
    }
    if cfg.schedule.enabled {
        providers.push(Box::new(ScheduleProvider::from_config(
            &cfg.schedule,
            timeout,
            &cfg.default_logo_url,
        )?));
    }
    Ok(providers)
}

/// Age-trim the run log before the cycle appends to it; failure is reported
/// and swallowed.
fn trim_run_log(log_file: &Path, max_age_hours: i64, run_code: &str) {
    match runlog::trim_log_file(log_file, Utc::now().naive_utc(), max_age_hours) {
        Ok(0) => {}
        Ok(removed) => tracing::info!(run = %run_code, removed, "trimmed old log lines"),
        Err(e) => tracing::warn!(error = ?e, run = %run_code, "log trim failed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();

    let (cfg, config_outcome) = AppConfig::load();
    init_tracing(cfg.log_file.as_deref())?;

    match &config_outcome {
        LoadOutcome::Loaded(path) => {
            tracing::info!(config = %path.display(), "configuration loaded")
        }
        LoadOutcome::Missing(path) => {
            tracing::warn!(config = %path.display(), "no configuration file found, using built-in defaults")
        }
        LoadOutcome::Invalid { path, error } => {
            tracing::warn!(config = %path.display(), %error, "config file invalid, using built-in defaults")
        }
    }

    let run_code = runlog::generate_run_code();

    if let Some(log_file) = cfg.log_file.as_deref() {
        trim_run_log(log_file, cfg.log_retention_hours, &run_code);
    }

    let providers = build_providers(&cfg)?;
    if providers.is_empty() {
        anyhow::bail!("no sources enabled, nothing to do");
    }

    tracing::info!(run = %run_code, sources = providers.len(), "cycle starting");

    let report = match pipeline::run_cycle(&cfg, &providers, Utc::now())
        .instrument(tracing::info_span!("cycle", run = %run_code))
        .await
    {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = ?e, run = %run_code, "cycle failed, previous collection left intact");
            return Err(e);
        }
    };

    tracing::info!(
        run = %run_code,
        total = report.total,
        added = report.merge.added,
        updated = report.merge.updated,
        carried = report.merge.carried,
        "cycle finished"
    );
    Ok(())
}
