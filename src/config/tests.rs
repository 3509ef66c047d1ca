use super::settings::{DispatcherConfig, PartialDispatcherSettings, Settings};
use super::{load_config, load_config_from};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("dispatcher.toml");
    fs::write(&path, body).expect("write config file");
    path
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert!(settings.dispatcher.subtopics);
    assert_eq!(settings.dispatcher.subtopic_marker, ":");
    assert!(!settings.dispatcher.log);
}

#[test]
fn test_builder_overrides() {
    let config = DispatcherConfig::default()
        .with_subtopics(false)
        .with_subtopic_marker("/")
        .with_log(true);
    assert!(!config.subtopics);
    assert_eq!(config.subtopic_marker, "/");
    assert!(config.log);
}

#[test]
fn test_partial_merge_keeps_unset_defaults() {
    let partial = PartialDispatcherSettings {
        log: Some(true),
        ..Default::default()
    };
    let merged = partial.merge_over(DispatcherConfig::default());
    assert!(merged.subtopics);
    assert_eq!(merged.subtopic_marker, ":");
    assert!(merged.log);
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = write_config(
        &tmp,
        r#"
            [dispatcher]
            subtopics = false
            subtopic_marker = "/"
            log = true
        "#,
    );

    let cfg = load_config_from(&path).expect("load_config_from failed");
    assert!(!cfg.dispatcher.subtopics);
    assert_eq!(cfg.dispatcher.subtopic_marker, "/");
    assert!(cfg.dispatcher.log);
}

#[test]
#[serial]
fn load_config_ignores_unknown_keys() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = write_config(
        &tmp,
        r#"
            [dispatcher]
            subtopic_marker = "."
            replay = true

            [server]
            port = 9000
        "#,
    );

    let cfg = load_config_from(&path).expect("load_config_from failed");
    assert!(cfg.dispatcher.subtopics);
    assert_eq!(cfg.dispatcher.subtopic_marker, ".");
    assert!(!cfg.dispatcher.log);
}

#[test]
#[serial]
fn load_config_reads_environment() {
    temp_env::with_vars(
        [
            ("TOPICSUB__DISPATCHER__SUBTOPICS", Some("false")),
            ("TOPICSUB__DISPATCHER__SUBTOPIC_MARKER", Some("/")),
        ],
        || {
            let cfg = load_config().expect("load_config failed");
            assert!(!cfg.dispatcher.subtopics);
            assert_eq!(cfg.dispatcher.subtopic_marker, "/");
            assert!(!cfg.dispatcher.log);
        },
    );
}

#[test]
#[serial]
fn environment_wins_over_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = write_config(
        &tmp,
        r#"
            [dispatcher]
            log = false
        "#,
    );

    temp_env::with_var("TOPICSUB__DISPATCHER__LOG", Some("true"), || {
        let cfg = load_config_from(&path).expect("load_config_from failed");
        assert!(cfg.dispatcher.log);
    });
}
