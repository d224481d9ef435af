use longplay_headless::config::AppConfig;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_are_valid() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
    assert!(config.storage.fallback_to_memory);
    assert_eq!(config.session.poll_interval_ms, 250);
}

#[test]
fn file_overrides_nested_session_settings() {
    let file = write_config(
        r#"
[storage]
database_url = "sqlite://./test.db"

[session]
poll_interval_ms = 500
previous_restart_threshold_secs = 5.0

[output]
json = true
"#,
    );

    let config = AppConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.storage.database_url, "sqlite://./test.db");
    assert_eq!(config.session.poll_interval_ms, 500);
    assert_eq!(config.session.previous_restart_threshold_secs, 5.0);
    assert_eq!(config.session.checkpoint_interval_secs, 10);
    assert!(config.output.json);
    assert!(config.validate().is_ok());
}

#[test]
fn invalid_session_settings_fail_validation() {
    let file = write_config(
        r#"
[session]
poll_interval_ms = 0
"#,
    );

    let config = AppConfig::load(Some(file.path())).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(AppConfig::load(Some(&path)).is_err());
}
