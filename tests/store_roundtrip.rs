// tests/store_roundtrip.rs
use matchday_aggregator::record::{EventRecord, TeamInfo};
use matchday_aggregator::store::{load_events, save_events};

fn mk(team1: &str) -> EventRecord {
    EventRecord {
        source_name: "Streamed".to_string(),
        title: Some(format!("{team1} vs Braga")),
        team1: TeamInfo {
            name: team1.to_string(),
            logo_url: "https://img/a.webp".to_string(),
        },
        team2: TeamInfo {
            name: "Braga".to_string(),
            logo_url: "https://img/b.webp".to_string(),
        },
        time: "20:00".into(),
        date: "05-03-2026".into(),
        links: vec!["https://s/1".to_string(), "https://s/2".into()],
        match_id: "ABCDEFGHIJAB".into(),
        kickoff_ms: Some(1_772_740_800_000),
    }
}

#[test]
fn save_then_load_preserves_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");

    let records = vec![mk("Porto"), mk("Inter")];
    save_events(&path, &records).unwrap();

    assert_eq!(load_events(&path), records);
}

#[test]
fn a_missing_file_loads_as_an_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_events(&dir.path().join("absent.json")).is_empty());
}

#[test]
fn a_corrupt_file_loads_as_an_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    std::fs::write(&path, "definitely: not json").unwrap();

    assert!(load_events(&path).is_empty());
}

#[test]
fn malformed_elements_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");

    let doc = serde_json::json!([
        serde_json::to_value(mk("Porto")).unwrap(),
        {"junk": true},
        17,
    ]);
    std::fs::write(&path, doc.to_string()).unwrap();

    let loaded = load_events(&path);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].team1.name, "Porto");
}

#[test]
fn legacy_documents_without_newer_fields_still_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");

    std::fs::write(
        &path,
        r#"[{
            "team1": {"name": "Porto", "logo_url": "https://img/a.webp"},
            "team2": {"name": "Braga", "logo_url": "https://img/b.webp"},
            "time": "20:00",
            "date": "05-03-2026",
            "links": ["https://s/1"]
        }]"#,
    )
    .unwrap();

    let loaded = load_events(&path);
    assert_eq!(loaded.len(), 1);
    assert!(loaded[0].source_name.is_empty());
    assert!(loaded[0].match_id.is_empty());
    assert!(loaded[0].kickoff_ms.is_none());
}

#[test]
fn saving_overwrites_in_place_and_cleans_up_its_tmp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");

    save_events(&path, &[mk("Porto")]).unwrap();
    save_events(&path, &[mk("Inter")]).unwrap();

    let loaded = load_events(&path);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].team1.name, "Inter");

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|n| n.to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn a_failed_save_leaves_the_prior_file_intact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");

    save_events(&path, &[mk("Porto")]).unwrap();
    let before = std::fs::read(&path).unwrap();

    // A directory squatting on the tmp sibling makes the write step fail.
    std::fs::create_dir(dir.path().join("events.json.tmp")).unwrap();

    assert!(save_events(&path, &[mk("Inter")]).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), before);

    let loaded = load_events(&path);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].team1.name, "Porto");
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("deep").join("events.json");

    save_events(&path, &[mk("Porto")]).unwrap();
    assert_eq!(load_events(&path).len(), 1);
}
