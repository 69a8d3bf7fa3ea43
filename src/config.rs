// src/config.rs
//! Operational knobs, loaded from a TOML file with env-var overrides and
//! clamped into sane ranges.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::record::PLACEHOLDER_LOGO_URL;
use crate::similarity::DEFAULT_SIMILARITY_THRESHOLD;

pub const DEFAULT_CONFIG_PATH: &str = "config/aggregator.toml";

pub const ENV_CONFIG_PATH: &str = "AGGREGATOR_CONFIG_PATH";
pub const ENV_SIMILARITY_THRESHOLD: &str = "AGGREGATOR_SIMILARITY_THRESHOLD";
pub const ENV_RETENTION_HOURS: &str = "AGGREGATOR_RETENTION_HOURS";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output_file: PathBuf,
    /// When set, log lines are tee'd to this file and trimmed by age.
    pub log_file: Option<PathBuf>,
    pub retention_hours: i64,
    pub log_retention_hours: i64,
    pub similarity_threshold: f64,
    pub request_timeout_secs: u64,
    pub stream_fetch_delay_ms: u64,
    /// When false the two feeds persist side by side, keyed by source name.
    pub cross_source_matching: bool,
    pub default_logo_url: String,
    pub streamed: StreamedConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamedConfig {
    pub enabled: bool,
    pub base_url: String,
    pub source_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub url: String,
    pub source_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("live_events.json"),
            log_file: None,
            retention_hours: 12,
            log_retention_hours: 72,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            request_timeout_secs: 10,
            stream_fetch_delay_ms: 500,
            cross_source_matching: true,
            default_logo_url: PLACEHOLDER_LOGO_URL.to_string(),
            streamed: StreamedConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Default for StreamedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://streamed.su".to_string(),
            source_name: "Streamed".to_string(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://sportsonline.gl/".to_string(),
            source_name: "Sportsonline".to_string(),
        }
    }
}

/// What `AppConfig::load` found at the resolved config path.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(PathBuf),
    Missing(PathBuf),
    Invalid { path: PathBuf, error: String },
}

impl AppConfig {
    /// Load from `$AGGREGATOR_CONFIG_PATH`, falling back to the default path,
    /// falling back to built-in defaults. Env knob overrides and range clamps
    /// apply in every case. Loading runs before tracing is initialized, so
    /// the outcome is handed back for the caller to report instead of being
    /// logged here.
    pub fn load() -> (Self, LoadOutcome) {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let (mut cfg, outcome) = match Self::load_from(&path) {
            Ok(cfg) => (cfg, LoadOutcome::Loaded(path)),
            Err(_) if !path.exists() => (Self::default(), LoadOutcome::Missing(path)),
            Err(e) => {
                let outcome = LoadOutcome::Invalid {
                    path,
                    error: format!("{e:#}"),
                };
                (Self::default(), outcome)
            }
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        (cfg, outcome)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).context("parsing config toml")
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env::<f64>(ENV_SIMILARITY_THRESHOLD) {
            self.similarity_threshold = v;
        }
        if let Some(v) = parse_env::<i64>(ENV_RETENTION_HOURS) {
            self.retention_hours = v;
        }
    }

    fn sanitize(&mut self) {
        self.similarity_threshold = self.similarity_threshold.clamp(0.0, 1.0);
        self.retention_hours = self.retention_hours.max(1);
        self.log_retention_hours = self.log_retention_hours.max(1);
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 120);
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
