// tests/memory_persistence_test.rs
// File-backed persistence: identity stability, corrupt-record recovery, and
// clear scopes, all against a real data directory.

use std::fs;

use tempfile::TempDir;

use orion::identity::{self, HostProbe};
use orion::memory::types::{MediumTermMemory, ProjectContext};
use orion::storage::{ClearScope, FileStore, MemoryStore};

#[test]
fn identity_is_stable_across_process_restarts() {
    let dir = TempDir::new().unwrap();

    let first = {
        let kv = FileStore::open(dir.path()).unwrap();
        identity::get_or_create(&kv, &HostProbe)
    };
    let second = {
        let kv = FileStore::open(dir.path()).unwrap();
        identity::get_or_create(&kv, &HostProbe)
    };

    assert_eq!(first.id, second.id);
    assert_eq!(first.created_at, second.created_at);
    assert!(first.id.starts_with("orion_"));
}

#[test]
fn corrupt_tier_file_loads_as_empty_default() {
    let dir = TempDir::new().unwrap();
    let kv = FileStore::open(dir.path()).unwrap();
    let store = MemoryStore::new(Box::new(kv), "dev_test");

    let mut medium = MediumTermMemory::default();
    medium
        .projects
        .insert("orion".into(), ProjectContext::new("memory engine"));
    assert!(store.save_medium(&medium));

    // Truncate the record behind the store's back.
    fs::write(dir.path().join("orion_dev_test_memory_medium.json"), "{oops").unwrap();
    assert!(store.load_medium().projects.is_empty());
}

#[test]
fn clear_scopes_remove_only_their_records() {
    let dir = TempDir::new().unwrap();
    let kv = FileStore::open(dir.path()).unwrap();
    let store = MemoryStore::new(Box::new(kv), "dev_test");

    let mut medium = MediumTermMemory::default();
    medium
        .projects
        .insert("orion".into(), ProjectContext::new("memory engine"));
    store.save_medium(&medium);

    let mut long = orion::memory::types::LongTermMemory::default();
    long.facts.insert(
        "editor".into(),
        orion::memory::types::Fact {
            value: "helix".into(),
            confidence: 0.8,
            first_observed: chrono::Utc::now(),
            reinforced_count: 2,
        },
    );
    store.save_long(&long);

    store.clear(ClearScope::Medium);
    assert!(store.load_medium().projects.is_empty());
    assert_eq!(store.load_long().facts.len(), 1);

    store.clear(ClearScope::All);
    assert!(store.load_long().facts.is_empty());
}

#[test]
fn clearing_memory_never_touches_the_identity() {
    let dir = TempDir::new().unwrap();
    let kv = FileStore::open(dir.path()).unwrap();
    let created = identity::get_or_create(&kv, &HostProbe);

    let store = MemoryStore::new(Box::new(kv), &created.id);
    store.clear(ClearScope::All);

    let kv = FileStore::open(dir.path()).unwrap();
    let reloaded = identity::get_or_create(&kv, &HostProbe);
    assert_eq!(created.id, reloaded.id);
}
