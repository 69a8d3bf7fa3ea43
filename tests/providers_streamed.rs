// tests/providers_streamed.rs
use matchday_aggregator::ingest::providers::StreamedProvider;
use matchday_aggregator::ingest::types::SourceProvider;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

const FIXTURE: &str = r#"[
    {
        "title": "Real Madrid vs Barcelona",
        "team1": {"name": "Real Madrid", "logo_url": "https://img/rm.webp"},
        "team2": {"name": "Barcelona", "logo_url": "https://img/fcb.webp"},
        "time": "20:00",
        "date": "05-03-2026",
        "links": ["https://embed.example/1"],
        "match_id": "rm-fcb-1",
        "_timestamp": 1772740800000
    },
    {
        "source_name": "Elsewhere",
        "team1": {"name": "Porto", "logo_url": "https://img/p.webp"},
        "team2": {"name": "Braga", "logo_url": "https://img/b.webp"},
        "time": "18:00",
        "date": "05-03-2026",
        "links": ["https://embed.example/2"]
    }
]"#;

#[tokio::test]
async fn fixture_records_load_and_take_the_configured_source_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamed.json");
    std::fs::write(&path, FIXTURE).unwrap();

    let provider = StreamedProvider::from_fixture(&path, "Streamed");
    let records = provider.fetch_latest().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source_name, "Streamed");
    assert_eq!(records[0].kickoff_ms, Some(1_772_740_800_000));
    assert_eq!(records[0].match_id, "rm-fcb-1");
    // an explicit source name in the fixture wins
    assert_eq!(records[1].source_name, "Elsewhere");
    assert!(records[1].kickoff_ms.is_none());
}

#[test]
fn fixture_fetches_are_counted_in_telemetry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamed.json");
    std::fs::write(&path, FIXTURE).unwrap();

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let provider = StreamedProvider::from_fixture(&path, "Streamed");

    let records = metrics::with_local_recorder(&recorder, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(provider.fetch_latest())
    })
    .unwrap();
    assert_eq!(records.len(), 2);

    let counted = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find(|(key, _, _, _)| key.key().name() == "fetch_events_total")
        .map(|(_, _, _, value)| value);
    assert!(matches!(counted, Some(DebugValue::Counter(2))), "got {counted:?}");
}

#[tokio::test]
async fn a_fixture_that_is_not_a_record_array_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streamed.json");
    std::fs::write(&path, r#"{"matches": []}"#).unwrap();

    let provider = StreamedProvider::from_fixture(&path, "Streamed");
    assert!(provider.fetch_latest().await.is_err());
}
