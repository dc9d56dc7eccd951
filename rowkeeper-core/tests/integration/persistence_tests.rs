//! Reopening, corruption, legacy migration and settings files

use std::fs;

use rowkeeper_core::{
    COLLAPSED_KEY, EngineSettings, FileStore, KeyValueStore, LEGACY_ORDER_KEY, ListEngine,
    MIGRATION_FLAG_KEY, MemoryStore, ORDER_KEY, decode_order,
};
use tempfile::TempDir;

use super::fixtures::{group, id, leaf, open, provider};

#[test]
fn order_and_collapse_survive_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let mut engine = open(FileStore::new(temp.path()));
        assert!(engine.is_first_run());
        engine.move_entry(&group("Work"), 0).unwrap();
        engine.set_collapsed("Favorites", true);
    }

    let engine = open(FileStore::new(temp.path()));
    assert!(!engine.is_first_run());
    assert_eq!(
        engine.order(),
        &[group("Work"), group("Favorites"), leaf("a"), leaf("b"), leaf("c")]
    );
    assert!(engine.collapsed().contains("Favorites"));
}

#[test]
fn stored_file_is_versioned_envelope() {
    let temp = TempDir::new().unwrap();
    let _engine = open(FileStore::new(temp.path()));

    let raw = fs::read_to_string(temp.path().join(format!("{ORDER_KEY}.json"))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["entries"][0]["isGroup"], true);
    assert_eq!(value["entries"][0]["identifier"], "Favorites");
    assert_eq!(decode_order(&raw).unwrap().len(), 5);
}

#[test]
fn corrupt_store_falls_back_to_default() {
    let mut backend = MemoryStore::new();
    backend.set_string(ORDER_KEY, "{not json").unwrap();

    let engine = open(backend);
    assert!(engine.is_first_run());
    assert_eq!(
        engine.order(),
        &[group("Favorites"), group("Work"), leaf("a"), leaf("b"), leaf("c")]
    );
    // The default replaces the corrupt value.
    let stored = engine.store().backend().raw(ORDER_KEY).unwrap();
    assert_eq!(decode_order(stored).unwrap(), engine.order());
}

#[test]
fn stale_store_is_repaired_and_rewritten() {
    let mut backend = MemoryStore::new();
    backend
        .set_string(
            ORDER_KEY,
            r#"[{"isGroup":false,"identifier":"c"},{"isGroup":false,"identifier":"gone"},{"isGroup":true,"identifier":"Work"},{"isGroup":false,"identifier":"c"}]"#,
        )
        .unwrap();

    let engine = open(backend);
    assert!(!engine.is_first_run());
    assert_eq!(
        engine.order(),
        &[leaf("c"), group("Work"), group("Favorites"), leaf("a"), leaf("b")]
    );
    let stored = engine.store().backend().raw(ORDER_KEY).unwrap();
    assert_eq!(decode_order(stored).unwrap(), engine.order());
}

#[test]
fn legacy_order_migrates_once() {
    let mut backend = MemoryStore::new();
    backend
        .set_string(LEGACY_ORDER_KEY, r#"["c","zz","f1","a"]"#)
        .unwrap();

    let mut engine = open(backend);
    assert!(!engine.is_first_run());
    assert_eq!(
        engine.order(),
        &[group("Favorites"), group("Work"), leaf("c"), leaf("a"), leaf("b")]
    );
    assert_eq!(engine.store().backend().raw(MIGRATION_FLAG_KEY), Some("true"));

    engine.move_entry(&leaf("b"), 0).unwrap();
    let mut backend = engine.store().backend().clone();
    drop(engine);

    // A rewritten legacy value must not be picked up again.
    backend.set_string(LEGACY_ORDER_KEY, r#"["a"]"#).unwrap();
    let engine = open(backend);
    assert_eq!(
        engine.order(),
        &[leaf("b"), group("Favorites"), group("Work"), leaf("c"), leaf("a")]
    );
}

#[test]
fn corrupt_legacy_order_still_sets_flag() {
    let mut backend = MemoryStore::new();
    backend.set_string(LEGACY_ORDER_KEY, "nope").unwrap();

    let engine = open(backend);
    assert!(engine.is_first_run());
    assert_eq!(engine.store().backend().raw(MIGRATION_FLAG_KEY), Some("true"));
}

#[test]
fn write_failures_keep_memory_order() {
    let mut backend = MemoryStore::new();
    backend.set_fail_writes(true);

    let mut engine = open(backend);
    engine.move_entry(&leaf("c"), 0).unwrap();
    engine.stack(&id("a"), &id("b")).unwrap();

    assert_eq!(
        engine.order(),
        &[leaf("c"), group("Favorites"), group("Work"), group("New Group")]
    );
    assert_eq!(engine.store().backend().raw(ORDER_KEY), None);
}

#[test]
fn read_failure_opens_with_default() {
    let stored = r#"[{"isGroup":false,"identifier":"c"},{"isGroup":false,"identifier":"b"},{"isGroup":false,"identifier":"a"},{"isGroup":true,"identifier":"Work"},{"isGroup":true,"identifier":"Favorites"}]"#;
    let mut backend = MemoryStore::new();
    backend.set_string(ORDER_KEY, stored).unwrap();
    backend.set_fail_reads(true);

    let engine = open(backend);
    assert_eq!(
        engine.order(),
        &[group("Favorites"), group("Work"), leaf("a"), leaf("b"), leaf("c")]
    );
    // The unreadable value may be the user's order, so it is not replaced.
    assert_eq!(engine.store().backend().raw(ORDER_KEY), Some(stored));
}

#[test]
fn collapsed_set_prunes_dead_groups() {
    let mut backend = MemoryStore::new();
    backend
        .set_string(COLLAPSED_KEY, r#"["Work","Archive"]"#)
        .unwrap();

    let engine = open(backend);
    assert_eq!(
        engine.collapsed().iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["Work"]
    );
}

#[test]
fn settings_file_drives_group_name() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rowkeeper.toml");
    fs::write(&path, "new_group_name = \"Folder\"\nstack_hover_ms = 200\n").unwrap();

    let settings = EngineSettings::load(&path).unwrap();
    assert_eq!(settings.stack_hover_ms, 200);
    assert_eq!(settings.drag_threshold, EngineSettings::default().drag_threshold);

    let mut engine = ListEngine::open(provider(), MemoryStore::new(), settings);
    engine.stack(&id("a"), &id("c")).unwrap();
    assert_eq!(engine.order()[2], group("Folder"));
}

#[test]
fn invalid_settings_fall_back_to_defaults() {
    let settings = EngineSettings {
        drag_threshold: -1.0,
        ..EngineSettings::default()
    };
    let engine = ListEngine::open(provider(), MemoryStore::new(), settings);
    assert_eq!(engine.settings(), &EngineSettings::default());
}
