use confmon_fs::{ConfigStore, Error};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct ReloadSection {
    url: String,
    timeout_secs: u64,
}

#[test]
fn test_load_yaml_document() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.yaml");
    fs::write(&path, "url: http://prometheus:9090\ntimeout_secs: 5\n").unwrap();

    let loaded: ReloadSection = ConfigStore::new().load(&path).unwrap();

    assert_eq!(
        loaded,
        ReloadSection {
            url: "http://prometheus:9090".into(),
            timeout_secs: 5,
        }
    );
}

#[test]
fn test_load_toml_document() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.toml");
    fs::write(&path, "url = \"http://localhost:9090\"\ntimeout_secs = 30\n").unwrap();

    let loaded: ReloadSection = ConfigStore::new().load(&path).unwrap();

    assert_eq!(loaded.timeout_secs, 30);
}

#[test]
fn test_save_then_load_json_document() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    let store = ConfigStore::new();
    let section = ReloadSection {
        url: "http://localhost:9090".into(),
        timeout_secs: 10,
    };

    store.save(&path, &section).unwrap();
    let loaded: ReloadSection = store.load(&path).unwrap();

    assert_eq!(loaded, section);
}

#[test]
fn test_parse_error_names_format_and_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.yaml");
    fs::write(&path, "url: [unterminated\n").unwrap();

    let err = ConfigStore::new().load::<ReloadSection>(&path).unwrap_err();

    match err {
        Error::ConfigParse { path: p, format, .. } => {
            assert_eq!(p, path);
            assert_eq!(format, "YAML");
        }
        other => panic!("expected ConfigParse, got {other:?}"),
    }
}
