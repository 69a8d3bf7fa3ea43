// src/similarity.rs
use strsim::normalized_levenshtein;

use crate::normalize::normalize_team_name;

/// Pairing score below this is treated as "different fixtures".
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Confidence in [0,1] that two candidates, each an ordered (team1, team2)
/// pair, denote the same fixture. Both pairings are scored and the better one
/// wins, so it does not matter which side a source lists as home. Any empty
/// name scores 0.0 outright.
pub fn event_similarity(left: (&str, &str), right: (&str, &str)) -> f64 {
    let a1 = normalize_team_name(left.0);
    let a2 = normalize_team_name(left.1);
    let b1 = normalize_team_name(right.0);
    let b2 = normalize_team_name(right.1);

    if a1.is_empty() || a2.is_empty() || b1.is_empty() || b2.is_empty() {
        return 0.0;
    }

    let straight =
        (normalized_levenshtein(&a1, &b1) + normalized_levenshtein(&a2, &b2)) / 2.0;
    let crossed =
        (normalized_levenshtein(&a1, &b2) + normalized_levenshtein(&a2, &b1)) / 2.0;

    straight.max(crossed)
}
