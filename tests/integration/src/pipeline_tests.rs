//! End-to-end pipeline: catalog -> resolution -> rule files -> reload
//!
//! Runs against the shared fixture catalog in `test-fixtures/catalogs`.

use confmon_core::{
    AlertHierarchyResolver, AlertRuleStore, Catalog, MemoryStore, ReloadSettings, ScopeResolver,
};
use confmon_rules::{
    GenerateOutcome, HttpReloadTrigger, PrometheusRuleGenerator, RuleFileManager, RulePublisher,
};
use pretty_assertions::assert_eq;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

const CATALOG: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../test-fixtures/catalogs/basic.yaml"
);
const ROOT_GROUP: Uuid = Uuid::from_u128(0xb1);
const WEB_GROUP: Uuid = Uuid::from_u128(0xb2);
const TARGET: Uuid = Uuid::from_u128(0xc1);
const ROOT_RULE: Uuid = Uuid::from_u128(0xf1);

fn fixture_store() -> MemoryStore {
    Catalog::load(Path::new(CATALOG))
        .unwrap()
        .into_store()
        .unwrap()
}

/// Minimal stand-in for the engine's reload endpoint: answers `count`
/// requests with 200 and returns their request lines.
fn reload_endpoint(count: usize) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..count {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            seen.push(line.trim_end().to_string());
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                    break;
                }
            }
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .unwrap();
        }
        seen
    });

    (url, handle)
}

fn trigger(url: &str) -> HttpReloadTrigger {
    HttpReloadTrigger::new(&ReloadSettings {
        url: url.to_string(),
        timeout_secs: 5,
        max_retries: 0,
        ..ReloadSettings::default()
    })
    .unwrap()
}

#[test]
fn fixture_resolves_checks_and_alerts() {
    let store = fixture_store();

    let checks = ScopeResolver::new(&store).effective_checks(TARGET).unwrap();
    let mut names: Vec<&str> = checks.iter().map(|c| c.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["cpu", "disk"]);
    let cpu = checks.iter().find(|c| c.name == "cpu").unwrap();
    assert_eq!(cpu.instance_id, Uuid::from_u128(0xe2));
    assert_eq!(cpu.config["threshold"], 95);

    let rules = AlertHierarchyResolver::new(&store)
        .resolve_for_target(TARGET)
        .unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].source_group_id, WEB_GROUP);
    assert_eq!(rules[0].query, "avg(cpu_usage) > 95");
}

#[test]
fn publish_all_writes_files_and_reloads_once() {
    let store = fixture_store();
    let dir = TempDir::new().unwrap();
    let (url, server) = reload_endpoint(1);
    let publisher = RulePublisher::new(
        PrometheusRuleGenerator::new(&store, RuleFileManager::new(dir.path())),
        trigger(&url),
    );

    let report = publisher.publish_all().unwrap();

    assert_eq!(report.succeeded, vec![ROOT_GROUP, WEB_GROUP]);
    assert!(report.failed.is_empty());
    assert_eq!(server.join().unwrap(), vec!["POST /-/reload HTTP/1.1"]);

    let web = publisher.generator().files().read(WEB_GROUP).unwrap();
    let rule = &web.groups[0].rules[0];
    assert_eq!(rule.expr, "avg(cpu_usage) > 95");
    assert_eq!(rule.labels["severity"], "critical");
    assert_eq!(rule.for_duration, None);

    let root = publisher.generator().files().read(ROOT_GROUP).unwrap();
    assert_eq!(root.groups[0].rules[0].for_duration.as_deref(), Some("5m"));
}

#[test]
fn deleting_last_rule_removes_file_and_backs_it_up() {
    let store = fixture_store();
    let dir = TempDir::new().unwrap();
    let files = RuleFileManager::new(dir.path().join("rules"))
        .with_backups(dir.path().join("backups"), Duration::from_secs(3600));
    let generator = PrometheusRuleGenerator::new(&store, files);

    generator.generate_for_group(ROOT_GROUP).unwrap();
    store.soft_delete_alert_rule(ROOT_RULE).unwrap();

    let outcome = generator.generate_for_group(ROOT_GROUP).unwrap();

    assert_eq!(outcome, GenerateOutcome::Removed { existed: true });
    assert!(!generator.files().exists(ROOT_GROUP));
    assert_eq!(
        std::fs::read_dir(dir.path().join("backups")).unwrap().count(),
        1
    );
}

#[test]
fn store_snapshot_round_trips_through_json() {
    let store = fixture_store();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");

    store.snapshot().save(&path).unwrap();
    let reloaded = Catalog::load(&path).unwrap().into_store().unwrap();

    let before = ScopeResolver::new(&store).effective_checks(TARGET).unwrap();
    let after = ScopeResolver::new(&reloaded)
        .effective_checks(TARGET)
        .unwrap();
    assert_eq!(before, after);
}
