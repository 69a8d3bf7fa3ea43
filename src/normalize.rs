// src/normalize.rs
use once_cell::sync::OnceCell;
use regex::Regex;

/// Canonical lowercase form of a team name, for similarity comparison and
/// exact-key lookups. "Spain W", "Spain (w)" and "Spain Female" all collapse
/// to "spain women".
pub fn normalize_team_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut name = trimmed.to_lowercase();

    // 1) Feminine-designator suffix variants → " women"
    static RE_W: OnceCell<Regex> = OnceCell::new();
    static RE_PAREN_W: OnceCell<Regex> = OnceCell::new();
    static RE_WOMEN: OnceCell<Regex> = OnceCell::new();
    static RE_FEMALE: OnceCell<Regex> = OnceCell::new();
    name = RE_W
        .get_or_init(|| Regex::new(r"\s+w$").unwrap())
        .replace(&name, " women")
        .to_string();
    name = RE_PAREN_W
        .get_or_init(|| Regex::new(r"\s+\(w\)$").unwrap())
        .replace(&name, " women")
        .to_string();
    name = RE_WOMEN
        .get_or_init(|| Regex::new(r"\s+women$").unwrap())
        .replace(&name, " women")
        .to_string();
    name = RE_FEMALE
        .get_or_init(|| Regex::new(r"\s+female$").unwrap())
        .replace(&name, " women")
        .to_string();

    // 2) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    name = RE_WS
        .get_or_init(|| Regex::new(r"\s+").unwrap())
        .replace_all(&name, " ")
        .to_string();

    name.trim().to_string()
}
