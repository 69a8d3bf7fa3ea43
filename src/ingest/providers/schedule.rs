// src/ingest/providers/schedule.rs
//! Weekly plain-text schedule feed. The document is split into uppercase
//! day-name sections; each entry line reads `HH:MM Team A vs Team B | url`
//! with times published in UTC+1.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, Local, Timelike, Weekday};
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::ScheduleConfig;
use crate::ingest::BROWSER_USER_AGENT;
use crate::ingest::types::SourceProvider;
use crate::record::{is_valid_team_name, EventRecord, TeamInfo};

const DAY_NAMES: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

static RE_CHANNEL: OnceCell<Regex> = OnceCell::new();
static RE_TIME_TITLE: OnceCell<Regex> = OnceCell::new();

fn channel_re() -> &'static Regex {
    RE_CHANNEL.get_or_init(|| Regex::new(r"^(HD|BR)\d+\s+[A-Z]+$").unwrap())
}

fn time_title_re() -> &'static Regex {
    RE_TIME_TITLE.get_or_init(|| Regex::new(r"^(\d{1,2}:\d{2})\s+(.+)$").unwrap())
}

/// One stream line of the schedule, time already shifted to UTC.
#[derive(Debug)]
struct ScheduleLine {
    time: String,
    title: String,
    url: String,
}

pub struct ScheduleProvider {
    mode: Mode,
    source_name: String,
    default_logo: String,
}

enum Mode {
    /// A saved schedule document, run through the real parser.
    Fixture(PathBuf),
    Http { url: String, client: reqwest::Client },
}

impl ScheduleProvider {
    pub fn from_config(cfg: &ScheduleConfig, timeout: Duration, default_logo: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("building schedule http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: cfg.url.clone(),
                client,
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

    fn records_from_text(&self, raw: &str, now_local: DateTime<Local>) -> Vec<EventRecord> {
        let t0 = Instant::now();
        let lines = parse_schedule(raw, day_name(now_local.weekday()));
        let records = group_schedule(lines, now_local, &self.source_name, &self.default_logo);
        histogram!("fetch_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("fetch_events_total").increment(records.len() as u64);
        records
    }
}

#[async_trait]
impl SourceProvider for ScheduleProvider {
    async fn fetch_latest(&self) -> Result<Vec<EventRecord>> {
        let raw = match &self.mode {
            Mode::Fixture(path) => std::fs::read_to_string(path)
                .with_context(|| format!("reading fixture {}", path.display()))?,
            Mode::Http { url, client } => client
                .get(url)
                .send()
                .await
                .context("schedule request")?
                .error_for_status()
                .context("schedule response status")?
                .text()
                .await
                .context("schedule response body")?,
        };
        Ok(self.records_from_text(&raw, Local::now()))
    }

    fn name(&self) -> &'static str {
        "schedule"
    }
}

fn day_name(weekday: Weekday) -> &'static str {
    DAY_NAMES[weekday.num_days_from_monday() as usize]
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn split_time(time: &str) -> Option<(u32, u32)> {
    let (h, m) = time.split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    (h <= 23 && m <= 59).then_some((h, m))
}

/// Shifts a published UTC+1 time back to UTC. Malformed times pass through
/// untouched.
fn subtract_hour(time: &str) -> String {
    match split_time(time) {
        Some((h, m)) => format!("{:02}:{:02}", (h + 23) % 24, m),
        None => time.to_string(),
    }
}

fn time_to_minutes(time: &str) -> u32 {
    split_time(time).map(|(h, m)| h * 60 + m).unwrap_or(0)
}

/// Kickoffs before 06:00 belong to the following night and sort last.
fn sort_rank(time: &str) -> u32 {
    let minutes = time_to_minutes(time);
    if minutes < 360 {
        minutes + 1440
    } else {
        minutes
    }
}

/// Stream lines for the section named `day`, one per schedule row that
/// carries a usable time, a two-team title and an http(s) url.
fn parse_schedule(raw: &str, day: &str) -> Vec<ScheduleLine> {
    let mut in_section = false;
    let mut out = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let upper = line.to_uppercase();
        if DAY_NAMES.contains(&upper.as_str()) {
            in_section = upper == day;
            continue;
        }
        if channel_re().is_match(line) {
            continue;
        }
        if !in_section {
            continue;
        }

        let Some((left, url)) = line.split_once('|') else {
            continue;
        };
        let url = url.trim();
        if !is_http_url(url) {
            continue;
        }
        let Some(caps) = time_title_re().captures(left.trim()) else {
            continue;
        };
        let time = caps[1].to_string();
        let title = html_escape::decode_html_entities(caps[2].trim())
            .trim()
            .to_string();

        // Titles with a second colon are league headers, not fixtures.
        if title.contains(':') {
            continue;
        }
        let halves: Vec<&str> = if title.contains(" vs ") {
            title.split(" vs ").collect()
        } else if title.contains(" x ") {
            title.split(" x ").collect()
        } else {
            continue;
        };
        if halves.len() != 2 || halves[0].trim().is_empty() || halves[1].trim().is_empty() {
            continue;
        }

        out.push(ScheduleLine {
            time: subtract_hour(&time),
            title: title.replace(" x ", " vs "),
            url: url.to_string(),
        });
    }
    out
}

/// Collapses per-stream lines into one record per (time, title) with all
/// stream urls attached, sorted into broadcast order.
fn group_schedule(
    lines: Vec<ScheduleLine>,
    now_local: DateTime<Local>,
    source_name: &str,
    default_logo: &str,
) -> Vec<EventRecord> {
    let mut groups: Vec<(String, String, Vec<String>)> = Vec::new();
    for line in lines {
        match groups
            .iter_mut()
            .find(|(time, title, _)| *time == line.time && *title == line.title)
        {
            Some((_, _, urls)) => urls.push(line.url),
            None => groups.push((line.time, line.title, vec![line.url])),
        }
    }
    groups.sort_by_key(|(time, _, _)| sort_rank(time));

    let mut out = Vec::new();
    for (time, title, urls) in groups {
        let Some((team1, team2)) = title.split_once(" vs ") else {
            continue;
        };
        let team1 = team1.trim();
        let team2 = team2.trim();
        if !is_valid_team_name(team1) || !is_valid_team_name(team2) {
            tracing::warn!(%title, "invalid team data, skipping");
            continue;
        }

        let mut links: Vec<String> = Vec::new();
        for url in urls {
            if !links.contains(&url) {
                links.push(url);
            }
        }
        if links.is_empty() {
            continue;
        }

        let date = schedule_date(&time, now_local);
        out.push(EventRecord {
            source_name: source_name.to_string(),
            title: Some(title.clone()),
            team1: TeamInfo {
                name: team1.to_string(),
                logo_url: default_logo.to_string(),
            },
            team2: TeamInfo {
                name: team2.to_string(),
                logo_url: default_logo.to_string(),
            },
            time,
            date,
            links,
            match_id: String::new(),
            kickoff_ms: None,
        });
    }
    out
}

/// The schedule only states a weekday, so the calendar date is inferred:
/// an early-morning kickoff seen late in the evening belongs to tomorrow.
fn schedule_date(time: &str, now_local: DateTime<Local>) -> String {
    let date = match split_time(time) {
        Some((h, _)) if h <= 5 && now_local.hour() >= 18 => {
            now_local.date_naive() + ChronoDuration::days(1)
        }
        _ => now_local.date_naive(),
    };
    date.format("%d-%m-%Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    // 2026-03-05 is a Thursday.
    fn thursday_evening() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 5, 21, 0, 0).unwrap()
    }

    fn thursday_noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap()
    }

    const FIXTURE: &str = "\
WEDNESDAY
12:00 Old Fixture vs Stale Fixture | https://streams.example/old
THURSDAY
HD1 ENGLISH
20:00  Arsenal vs Chelsea | https://streams.example/a1
20:00 Arsenal vs Chelsea | https://streams.example/a2
20:00 Arsenal vs Chelsea | https://streams.example/a1
21:30 La Liga: Preview Show | https://streams.example/tv
21:15 Brighton &amp; Hove vs Leeds | https://streams.example/b1
05:30 Boca Juniors x River Plate | https://streams.example/c1
19:45 Standalone Programme | https://streams.example/d1
BR2 PORTUGUESE
bad line without pipe
20:00 No Url Here | ftp://streams.example/x
FRIDAY
20:00 Future Fixture vs Next Fixture | https://streams.example/f
";

    #[test]
    fn only_the_requested_day_section_is_parsed() {
        let lines = parse_schedule(FIXTURE, "THURSDAY");
        assert!(lines.iter().all(|l| !l.title.contains("Fixture")));
        let lines = parse_schedule(FIXTURE, "FRIDAY");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].title, "Future Fixture vs Next Fixture");
    }

    #[test]
    fn channel_rows_headers_and_bad_urls_are_skipped() {
        let titles: Vec<String> = parse_schedule(FIXTURE, "THURSDAY")
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert!(!titles.iter().any(|t| t.contains("Preview")));
        assert!(!titles.iter().any(|t| t.contains("Standalone")));
        assert!(!titles.iter().any(|t| t.contains("No Url")));
        assert_eq!(titles.iter().filter(|t| t.contains("Arsenal")).count(), 3);
    }

    #[test]
    fn times_shift_back_one_hour_and_x_separators_normalize() {
        let lines = parse_schedule(FIXTURE, "THURSDAY");
        let arsenal = lines.iter().find(|l| l.title.contains("Arsenal")).unwrap();
        assert_eq!(arsenal.time, "19:00");
        let boca = lines.iter().find(|l| l.title.contains("Boca")).unwrap();
        assert_eq!(boca.time, "04:30");
        assert_eq!(boca.title, "Boca Juniors vs River Plate");
    }

    #[test]
    fn html_entities_in_titles_are_decoded() {
        let lines = parse_schedule(FIXTURE, "THURSDAY");
        assert!(lines
            .iter()
            .any(|l| l.title == "Brighton & Hove vs Leeds"));
    }

    #[test]
    fn subtract_hour_wraps_midnight_and_passes_garbage_through() {
        assert_eq!(subtract_hour("00:30"), "23:30");
        assert_eq!(subtract_hour("13:05"), "12:05");
        assert_eq!(subtract_hour("9:15"), "08:15");
        assert_eq!(subtract_hour("25:00"), "25:00");
        assert_eq!(subtract_hour("kickoff"), "kickoff");
    }

    #[test]
    fn grouping_joins_streams_and_drops_duplicates() {
        let lines = parse_schedule(FIXTURE, "THURSDAY");
        let records = group_schedule(lines, thursday_noon(), "Sportsonline", "https://logo/d.png");
        let arsenal = records
            .iter()
            .find(|r| r.team1.name == "Arsenal")
            .unwrap();
        assert_eq!(
            arsenal.links,
            vec![
                "https://streams.example/a1".to_string(),
                "https://streams.example/a2".into()
            ]
        );
        assert_eq!(arsenal.source_name, "Sportsonline");
        assert_eq!(arsenal.team2.logo_url, "https://logo/d.png");
        assert!(arsenal.kickoff_ms.is_none());
        assert!(arsenal.match_id.is_empty());
    }

    #[test]
    fn early_morning_kickoffs_sort_after_the_evening() {
        let lines = parse_schedule(FIXTURE, "THURSDAY");
        let records = group_schedule(lines, thursday_noon(), "Sportsonline", "https://logo/d.png");
        let order: Vec<&str> = records.iter().map(|r| r.team1.name.as_str()).collect();
        assert_eq!(order, vec!["Arsenal", "Brighton & Hove", "Boca Juniors"]);
    }

    #[test]
    fn early_morning_kickoff_seen_in_the_evening_dates_tomorrow() {
        let lines = parse_schedule(FIXTURE, "THURSDAY");
        let records = group_schedule(
            lines,
            thursday_evening(),
            "Sportsonline",
            "https://logo/d.png",
        );
        let boca = records
            .iter()
            .find(|r| r.team1.name == "Boca Juniors")
            .unwrap();
        assert_eq!(boca.date, "06-03-2026");
        let arsenal = records
            .iter()
            .find(|r| r.team1.name == "Arsenal")
            .unwrap();
        assert_eq!(arsenal.date, "05-03-2026");
    }

    #[test]
    fn noon_run_keeps_early_morning_kickoffs_on_today() {
        let lines = parse_schedule(FIXTURE, "THURSDAY");
        let records = group_schedule(lines, thursday_noon(), "Sportsonline", "https://logo/d.png");
        let boca = records
            .iter()
            .find(|r| r.team1.name == "Boca Juniors")
            .unwrap();
        assert_eq!(boca.date, "05-03-2026");
    }
}
