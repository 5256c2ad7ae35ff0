//! Layered settings resolution

use confmon_core::{Error, Settings, SettingsResolver};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn resolver_in(dir: &TempDir) -> SettingsResolver {
    SettingsResolver::new().with_global_config_dir(dir.path().join("global"))
}

fn write(path: PathBuf, content: &str) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn defaults_apply_when_nothing_is_configured() {
    let dir = TempDir::new().unwrap();

    let settings = resolver_in(&dir).resolve().unwrap();

    assert_eq!(settings, Settings::default());
    assert_eq!(
        settings.rules.backup_dir(),
        PathBuf::from("/etc/prometheus/rules/generated/.backup")
    );
    assert_eq!(settings.reload.url, "http://localhost:9090");
    assert_eq!(settings.reload.timeout_secs, 30);
}

#[test]
fn global_file_overrides_only_the_keys_it_sets() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path().join("global/config.toml"),
        "[reload]\nurl = \"http://prom:9090\"\n",
    );

    let settings = resolver_in(&dir).resolve().unwrap();

    assert_eq!(settings.reload.url, "http://prom:9090");
    assert!(settings.reload.enabled);
    assert_eq!(settings.reload.max_retries, 3);
}

#[test]
fn explicit_file_beats_global_file() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path().join("global/config.toml"),
        "[rules]\ndir = \"/global/rules\"\nbackup_enabled = false\n",
    );
    let explicit = write(
        dir.path().join("confmon.yaml"),
        "rules:\n  dir: /explicit/rules\n",
    );

    let settings = resolver_in(&dir)
        .with_config_file(explicit)
        .resolve()
        .unwrap();

    assert_eq!(settings.rules.dir, PathBuf::from("/explicit/rules"));
    assert!(!settings.rules.backup_enabled);
}

#[test]
fn environment_beats_every_file() {
    let dir = TempDir::new().unwrap();
    let explicit = write(
        dir.path().join("confmon.toml"),
        "[reload]\nenabled = true\ntimeout_secs = 5\n",
    );

    let settings = resolver_in(&dir)
        .with_config_file(explicit)
        .with_env([
            ("CONFMON_RELOAD_ENABLED", "false"),
            ("CONFMON_RELOAD_TIMEOUT_SECS", "12"),
            ("CONFMON_LOG_LEVEL", "debug"),
            ("CONFMON_RULES_DIR", "/env/rules"),
        ])
        .resolve()
        .unwrap();

    assert!(!settings.reload.enabled);
    assert_eq!(settings.reload.timeout_secs, 12);
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.rules.dir, PathBuf::from("/env/rules"));
    assert_eq!(settings.rules.backup_dir(), PathBuf::from("/env/rules/.backup"));
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();

    let err = resolver_in(&dir)
        .with_config_file(dir.path().join("absent.toml"))
        .resolve()
        .unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn unparsable_layer_is_an_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path().join("global/config.toml"), "[reload\nurl = ");

    let err = resolver_in(&dir).resolve().unwrap_err();

    assert!(matches!(err, Error::Fs(_)));
}

#[test]
fn invalid_env_value_names_the_variable() {
    let dir = TempDir::new().unwrap();

    let err = resolver_in(&dir)
        .with_env([("CONFMON_RELOAD_TIMEOUT_SECS", "soon")])
        .resolve()
        .unwrap_err();

    assert!(err.to_string().contains("CONFMON_RELOAD_TIMEOUT_SECS"));
}
