// src/ingest/providers/streamed.rs
//! Two-phase JSON-API feed: a match listing first, then one stream-link
//! request per listed source, with a fixed delay between stream requests.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::config::StreamedConfig;
use crate::ingest::BROWSER_USER_AGENT;
use crate::ingest::types::SourceProvider;
use crate::record::{is_valid_team_name, EventRecord, TeamInfo, NOT_FOUND};

#[derive(Debug, Deserialize)]
struct ApiMatch {
    #[serde(default)]
    id: Option<String>,
    title: Option<String>,
    category: Option<String>,
    // epoch millis
    date: Option<i64>,
    teams: Option<ApiTeams>,
    #[serde(default)]
    sources: Vec<ApiSource>,
}

#[derive(Debug, Deserialize)]
struct ApiTeams {
    home: Option<ApiTeam>,
    away: Option<ApiTeam>,
}

#[derive(Debug, Deserialize)]
struct ApiTeam {
    name: Option<String>,
    badge: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    source: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiStream {
    #[serde(rename = "embedUrl")]
    embed_url: Option<String>,
}

/// A screened match still waiting for its stream links.
#[derive(Debug)]
struct PendingMatch {
    title: String,
    team1: TeamInfo,
    team2: TeamInfo,
    time: String,
    date: String,
    kickoff_ms: i64,
    match_id: String,
    sources: Vec<(String, String)>,
}

pub struct StreamedProvider {
    mode: Mode,
    source_name: String,
    default_logo: String,
}

enum Mode {
    /// Canned provider output (a JSON array of records) for offline runs.
    Fixture(PathBuf),
    Http {
        base_url: String,
        client: reqwest::Client,
        delay: Duration,
    },
}

impl StreamedProvider {
    pub fn from_config(
        cfg: &StreamedConfig,
        timeout: Duration,
        delay: Duration,
        default_logo: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("building streamed http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: cfg.base_url.trim_end_matches('/').to_string(),
                client,
                delay,
            },
            source_name: cfg.source_name.clone(),
            default_logo: default_logo.to_string(),
        })
    }

    pub fn from_fixture(path: impl Into<PathBuf>, source_name: &str) -> Self {
        Self {
            mode: Mode::Fixture(path.into()),
            source_name: source_name.to_string(),
            default_logo: crate::record::PLACEHOLDER_LOGO_URL.to_string(),
        }
    }

    async fn fetch_http(
        &self,
        base: &str,
        client: &reqwest::Client,
        delay: Duration,
    ) -> Result<Vec<EventRecord>> {
        let url = format!("{base}/api/matches/all-today");
        let body = client
            .get(&url)
            .send()
            .await
            .context("matches request")?
            .error_for_status()
            .context("matches response status")?
            .text()
            .await
            .context("matches response body")?;

        let t0 = Instant::now();
        let pending = screen_matches(&body, base, &self.default_logo)?;
        histogram!("fetch_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let mut out = Vec::with_capacity(pending.len());
        for p in pending {
            let links = self.collect_links(base, client, delay, &p).await;
            if links.is_empty() {
                tracing::warn!(title = %p.title, "no usable stream links, skipping");
                continue;
            }
            out.push(EventRecord {
                source_name: self.source_name.clone(),
                title: Some(p.title),
                team1: p.team1,
                team2: p.team2,
                time: p.time,
                date: p.date,
                links,
                match_id: p.match_id,
                kickoff_ms: Some(p.kickoff_ms),
            });
        }

        Ok(out)
    }

    async fn collect_links(
        &self,
        base: &str,
        client: &reqwest::Client,
        delay: Duration,
        pending: &PendingMatch,
    ) -> Vec<String> {
        let mut links: Vec<String> = Vec::new();
        for (source, id) in &pending.sources {
            let stream_url = format!("{base}/api/stream/{source}/{id}");
            match client.get(&stream_url).send().await {
                Ok(resp) => match resp.text().await {
                    Ok(body) => {
                        for url in parse_stream_links(&body) {
                            if !links.contains(&url) {
                                links.push(url);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = ?e, stream = %stream_url, "stream body error")
                    }
                },
                Err(e) => {
                    tracing::warn!(error = ?e, stream = %stream_url, "stream request error")
                }
            }
            tokio::time::sleep(delay).await;
        }
        links
    }
}

#[async_trait]
impl SourceProvider for StreamedProvider {
    async fn fetch_latest(&self) -> Result<Vec<EventRecord>> {
        let records = match &self.mode {
            Mode::Fixture(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading fixture {}", path.display()))?;
                let mut records: Vec<EventRecord> =
                    serde_json::from_str(&raw).context("parsing fixture records")?;
                for record in &mut records {
                    if record.source_name.is_empty() {
                        record.source_name = self.source_name.clone();
                    }
                }
                records
            }
            Mode::Http {
                base_url,
                client,
                delay,
            } => self.fetch_http(base_url, client, *delay).await?,
        };
        counter!("fetch_events_total").increment(records.len() as u64);
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "streamed"
    }
}

fn screen_matches(body: &str, base: &str, default_logo: &str) -> Result<Vec<PendingMatch>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(body).context("parsing matches json")?;

    let mut out = Vec::new();
    for value in values {
        let raw: ApiMatch = match serde_json::from_value(value) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed match entry");
                continue;
            }
        };
        if let Some(p) = screen_match(raw, base, default_logo) {
            out.push(p);
        }
    }
    Ok(out)
}

/// Category, kickoff and team screening; returns `None` for anything that
/// must not reach the merge stage.
fn screen_match(raw: ApiMatch, base: &str, default_logo: &str) -> Option<PendingMatch> {
    if raw.category.as_deref() != Some("football") {
        return None;
    }
    let title = raw.title.unwrap_or_else(|| "Title Not Found".to_string());

    let kickoff_ms = match raw.date {
        Some(ms) if ms > 0 => ms,
        _ => {
            tracing::warn!(%title, "missing or invalid kickoff timestamp, skipping");
            return None;
        }
    };
    let (time, date) = match format_kickoff(kickoff_ms) {
        Some(parts) => parts,
        None => {
            tracing::warn!(%title, kickoff_ms, "kickoff timestamp out of range, skipping");
            return None;
        }
    };

    let mut team1 = TeamInfo {
        name: NOT_FOUND.to_string(),
        logo_url: default_logo.to_string(),
    };
    let mut team2 = team1.clone();
    if let Some(teams) = raw.teams {
        if let Some(home) = teams.home {
            apply_team(&mut team1, home, base);
        }
        if let Some(away) = teams.away {
            apply_team(&mut team2, away, base);
        }
    }
    if !is_valid_team_name(&team1.name) || !is_valid_team_name(&team2.name) {
        tracing::warn!(%title, team1 = %team1.name, team2 = %team2.name, "invalid team data, skipping");
        return None;
    }

    let sources = raw
        .sources
        .into_iter()
        .filter_map(|s| match (s.source, s.id) {
            (Some(source), Some(id)) => Some((source, id)),
            _ => None,
        })
        .collect();

    Some(PendingMatch {
        title,
        team1,
        team2,
        time,
        date,
        kickoff_ms,
        match_id: raw.id.unwrap_or_default(),
        sources,
    })
}

fn apply_team(slot: &mut TeamInfo, api: ApiTeam, base: &str) {
    if let Some(name) = api.name {
        let name = name.trim();
        if !name.is_empty() {
            slot.name = name.to_string();
            if let Some(badge) = api.badge {
                slot.logo_url = badge_logo_url(base, &badge);
            }
        }
    }
}

fn badge_logo_url(base: &str, badge: &str) -> String {
    format!("{base}/api/images/badge/{badge}.webp")
}

/// UTC (`HH:MM`, `DD-MM-YYYY`) rendering of an epoch-millis kickoff.
fn format_kickoff(ms: i64) -> Option<(String, String)> {
    let dt = DateTime::from_timestamp_millis(ms)?;
    Some((
        dt.format("%H:%M").to_string(),
        dt.format("%d-%m-%Y").to_string(),
    ))
}

fn acceptable_embed(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://")) && !url.contains("admin")
}

/// Usable embed URLs from one stream response; anything unparseable counts
/// for nothing.
fn parse_stream_links(body: &str) -> Vec<String> {
    let streams: Vec<ApiStream> = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "stream response was not a json array");
            return Vec::new();
        }
    };
    streams
        .into_iter()
        .filter_map(|s| s.embed_url)
        .filter(|url| acceptable_embed(url))
        .collect()
}
