use cancellable_counter::runtime::config::CounterConfig;
use cancellable_counter::runtime::counter::RunSummary;
use cancellable_counter::runtime::event::{Event, EventRecord, RunOutcome};

fn fixture_value(path: &str) -> serde_json::Value {
    let data = std::fs::read_to_string(path).expect("read fixture");
    serde_json::from_str(&data).expect("parse fixture json")
}

#[test]
fn event_record_fixture_roundtrip_is_stable() {
    let fixture_path = format!(
        "{}/tests/golden/event_record_v1.json",
        env!("CARGO_MANIFEST_DIR")
    );
    let fixture = fixture_value(&fixture_path);
    let record: EventRecord = serde_json::from_value(fixture.clone()).expect("decode event record");

    assert_eq!(record.meta.seq, 3);
    match &record.event {
        Event::RunFinished {
            run_id,
            outcome,
            last_value,
        } => {
            assert_eq!(run_id, "run-1");
            assert_eq!(
                *outcome,
                RunOutcome::Stopped {
                    reason: "stop requested".to_string()
                }
            );
            assert_eq!(*last_value, Some(41));
        }
        other => panic!("expected run finished, got {:?}", other),
    }

    let encoded = serde_json::to_value(&record).expect("encode event record");
    assert_eq!(encoded, fixture);
}

#[test]
fn run_summary_fixture_roundtrip_is_stable() {
    let fixture_path = format!(
        "{}/tests/golden/run_summary_v1.json",
        env!("CARGO_MANIFEST_DIR")
    );
    let fixture = fixture_value(&fixture_path);
    let summary: RunSummary = serde_json::from_value(fixture.clone()).expect("decode run summary");

    assert!(summary.is_completed());
    assert_eq!(summary.emitted, 101);

    let encoded = serde_json::to_value(&summary).expect("encode run summary");
    assert_eq!(encoded, fixture);
}

#[test]
fn config_serializes_with_field_names() {
    let encoded = serde_json::to_value(CounterConfig::default()).expect("encode config");
    assert_eq!(encoded, serde_json::json!({ "bound": 100, "interval_ms": 50 }));
}
