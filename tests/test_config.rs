//! Config override unit tests

use servectl::config::DeploymentConfig;
use servectl::errors::ConfigError;

#[test]
fn test_parse_round_trips_entries() {
    let config = DeploymentConfig::parse([
        "MODEL_FILE=linear_model.py",
        "HANDLER_FILE=linear_handler.py",
    ])
    .unwrap();

    assert_eq!(
        config.to_pairs(),
        vec!["MODEL_FILE=linear_model.py", "HANDLER_FILE=linear_handler.py"]
    );
}

#[test]
fn test_parse_splits_on_first_equals_only() {
    let config = DeploymentConfig::parse(["EXTRA=a=b"]).unwrap();
    assert_eq!(config.get("EXTRA"), Some("a=b"));
    assert_eq!(config.to_pairs(), vec!["EXTRA=a=b"]);
}

#[test]
fn test_parse_rejects_entries_without_equals() {
    let err = DeploymentConfig::parse(["MIN_WORKER"]).unwrap_err();
    assert!(matches!(err, ConfigError::MalformedEntry(_)));
}

#[test]
fn test_later_duplicate_keys_win() {
    let config = DeploymentConfig::parse(["VERSION=1.0", "VERSION=2.0"]).unwrap();
    assert_eq!(config.version(), Some("2.0"));
}

#[test]
fn test_keys_are_case_sensitive() {
    let config = DeploymentConfig::parse(["version=1.0"]).unwrap();
    assert_eq!(config.version(), None);
    assert_eq!(config.passthrough(), vec![("version", "1.0")]);
}

#[test]
fn test_reserved_accessors() {
    let config = DeploymentConfig::parse([
        "VERSION=2.0",
        "MODEL_FILE=linear_model.py",
        "HANDLER_FILE=linear_handler.py",
        "MIN_WORKER=3",
        "SET-DEFAULT=true",
    ])
    .unwrap();

    assert_eq!(config.version(), Some("2.0"));
    assert_eq!(config.model_file(), Some("linear_model.py"));
    assert_eq!(config.handler_file(), Some("linear_handler.py"));
    assert_eq!(config.min_worker().unwrap(), Some(3));
    assert!(config.set_default().unwrap());
}

#[test]
fn test_min_worker_validated_at_call_time() {
    let config = DeploymentConfig::parse(["MIN_WORKER=many"]).unwrap();
    let err = config.min_worker().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn test_set_default_accepts_booleans_only() {
    let config = DeploymentConfig::parse(["SET-DEFAULT=FALSE"]).unwrap();
    assert!(!config.set_default().unwrap());

    let config = DeploymentConfig::parse(["SET-DEFAULT=yes"]).unwrap();
    assert!(matches!(
        config.set_default().unwrap_err(),
        ConfigError::InvalidValue { .. }
    ));
}

#[test]
fn test_passthrough_keeps_first_seen_order_with_last_value() {
    let config = DeploymentConfig::parse([
        "BATCH_SIZE=4",
        "VERSION=1.0",
        "MAX_BATCH_DELAY=200",
        "BATCH_SIZE=8",
    ])
    .unwrap();

    assert_eq!(
        config.passthrough(),
        vec![("BATCH_SIZE", "8"), ("MAX_BATCH_DELAY", "200")]
    );
}

#[test]
fn test_empty_config() {
    let config = DeploymentConfig::parse(Vec::<String>::new()).unwrap();
    assert!(config.is_empty());
    assert!(config.passthrough().is_empty());
}
