use cancellable_counter::runtime::config::CounterConfig;
use cancellable_counter::runtime::counter::CancellableCounter;
use cancellable_counter::runtime::error::CounterError;

use crate::fixtures::config_dir::ConfigDir;
use crate::helpers::progress::ProgressCollector;

#[test]
fn config_file_drives_the_run() {
    let dir = ConfigDir::new().expect("config dir");
    let path = dir
        .write("counter.json", r#"{"bound": 4, "interval_ms": 1}"#)
        .expect("write config");

    let config = CounterConfig::from_json_file(&path).expect("load config");
    let progress = ProgressCollector::new();
    let counter = CancellableCounter::new(config)
        .expect("counter")
        .on_progress(progress.handler());

    counter.start().expect("start");
    counter.join().expect("join");
    assert_eq!(progress.values(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn empty_object_yields_defaults() {
    let dir = ConfigDir::new().expect("config dir");
    let path = dir.write("nested/empty.json", "{}").expect("write config");

    let config = CounterConfig::from_json_file(path).expect("load config");
    assert_eq!(config, CounterConfig::default());
}

#[test]
fn missing_file_is_invalid_config() {
    let dir = ConfigDir::new().expect("config dir");
    let err = CounterConfig::from_json_file(dir.path("absent.json")).expect_err("missing file");

    match err {
        CounterError::InvalidConfig { message } => assert!(message.contains("absent.json")),
        other => panic!("expected invalid config, got {:?}", other),
    }
}

#[test]
fn wrong_field_type_is_invalid_config() {
    let dir = ConfigDir::new().expect("config dir");
    let path = dir
        .write("bad.json", r#"{"bound": "lots"}"#)
        .expect("write config");

    let err = CounterConfig::from_json_file(path).expect_err("bad type");
    assert!(matches!(err, CounterError::InvalidConfig { .. }));
    assert!(dir.root().exists());
}
