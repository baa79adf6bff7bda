//! Integration Tests for the TTL cache over the file-backed store
//!
//! Exercises persistence across sessions, expiry sweeps, namespaces and
//! quota handling against a real file in a temporary directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use folio::cache::{CacheConfig, ManualClock, TtlCache};
use folio::storage::{FileStore, KeyValueStore};
use serde_json::{json, Value};
use tempfile::TempDir;

const START: i64 = 1_700_000_000_000;

// == Helper Functions ==

fn open_cache(path: &Path, prefix: &str, clock: Arc<ManualClock>) -> (Arc<FileStore>, TtlCache) {
    let store = Arc::new(FileStore::open(path).unwrap());
    let config = CacheConfig {
        prefix: prefix.to_string(),
        ..CacheConfig::default()
    };
    let cache = TtlCache::with_clock(store.clone(), config, clock);
    (store, cache)
}

fn read_file(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// == Persistence ==

#[test]
fn test_entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let clock = Arc::new(ManualClock::new(START));

    {
        let (_, cache) = open_cache(&path, "portfolio-cache", clock.clone());
        assert!(cache.set("projects", &json!([{"name": "folio"}]), Some(600)));
    }

    let (_, cache) = open_cache(&path, "portfolio-cache", clock);
    assert_eq!(
        cache.get::<Value>("projects"),
        Some(json!([{"name": "folio"}]))
    );
}

#[test]
fn test_on_disk_entry_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let (_, cache) = open_cache(&path, "portfolio-cache", Arc::new(ManualClock::new(START)));

    cache.set("blog-list", &json!([{"id": 1}]), Some(60));

    let file = read_file(&path);
    let raw = file["portfolio-cache-blog-list"].as_str().unwrap();
    let entry: Value = serde_json::from_str(raw).unwrap();
    assert_eq!(entry, json!({"data": [{"id": 1}], "expiresAt": START + 60_000}));
    // Probe key is removed again
    assert!(file.get("portfolio-cache-test").is_none());
}

// == Expiry ==

#[test]
fn test_blog_list_scenario() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let clock = Arc::new(ManualClock::new(START));
    let (_, cache) = open_cache(&path, "portfolio-cache", clock.clone());

    assert!(cache.set("blog-list", &json!([{"id": 1}]), Some(1)));
    assert_eq!(cache.get::<Value>("blog-list"), Some(json!([{"id": 1}])));

    clock.advance(Duration::from_millis(1_500));

    assert_eq!(cache.get::<Value>("blog-list"), None);
    let stats = cache.get_stats();
    assert_eq!(stats.total_items, 0);
    assert_eq!(stats.expired_items, 0);
    assert!(read_file(&path).get("portfolio-cache-blog-list").is_none());
}

#[test]
fn test_reopen_sweeps_stale_entries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let clock = Arc::new(ManualClock::new(START));

    {
        let (store, cache) = open_cache(&path, "portfolio-cache", clock.clone());
        cache.set("short", &"gone soon", Some(1));
        cache.set("long", &"still here", Some(3600));
        store
            .set_item("portfolio-cache-broken", "{not json")
            .unwrap();
    }

    clock.advance(Duration::from_secs(5));
    let (store, cache) = open_cache(&path, "portfolio-cache", clock);

    let mut keys = store.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["portfolio-cache-long".to_string()]);
    assert_eq!(cache.get::<String>("long"), Some("still here".to_string()));
}

// == Namespaces ==

#[test]
fn test_prefixes_share_one_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let clock = Arc::new(ManualClock::new(START));
    let store: Arc<FileStore> = Arc::new(FileStore::open(&path).unwrap());

    let blog = TtlCache::with_clock(
        store.clone(),
        CacheConfig {
            prefix: "blog".to_string(),
            default_ttl: 60,
        },
        clock.clone(),
    );
    let projects = TtlCache::with_clock(
        store.clone(),
        CacheConfig {
            prefix: "projects".to_string(),
            default_ttl: 60,
        },
        clock,
    );

    blog.set("list", &json!([1, 2]), None);
    projects.set("list", &json!([3]), None);

    assert!(blog.clear());
    assert_eq!(blog.get::<Value>("list"), None);
    assert_eq!(projects.get::<Value>("list"), Some(json!([3])));
    let file = read_file(&path);
    assert!(file.get("blog-list").is_none());
    assert!(file.get("projects-list").is_some());
}

// == Quota ==

#[test]
fn test_quota_refuses_large_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let store = Arc::new(FileStore::open(&path).unwrap().with_quota(128));
    let cache = TtlCache::with_clock(
        store.clone(),
        CacheConfig::default(),
        Arc::new(ManualClock::new(START)),
    );

    assert!(cache.is_available());
    assert!(cache.set("small", &"ok", None));
    assert!(!cache.set("large", &"x".repeat(512), None));

    assert_eq!(cache.get::<String>("small"), Some("ok".to_string()));
    assert_eq!(cache.get::<String>("large"), None);
    assert!(read_file(&path).get("portfolio-cache-large").is_none());
}

// == Recovery ==

#[test]
fn test_corrupted_store_file_is_recoverable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    fs::write(&path, "{\"portfolio-cache-x\": ").unwrap();

    let (_, cache) = open_cache(&path, "portfolio-cache", Arc::new(ManualClock::new(START)));

    assert!(cache.is_available());
    assert!(cache.clear());
    assert!(read_file(&path).is_object());
    assert!(dir.path().join("storage.json.corrupt").exists());

    assert!(cache.set("blog-list", &json!([]), None));
    assert_eq!(cache.get::<Value>("blog-list"), Some(json!([])));
}

#[test]
fn test_two_sessions_share_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    let clock = Arc::new(ManualClock::new(START));
    let (_, first) = open_cache(&path, "portfolio-cache", clock.clone());
    let (_, second) = open_cache(&path, "portfolio-cache", clock.clone());

    first.set("projects", &json!(["folio"]), None);
    second.set("blog-list", &json!([1]), None);

    let (_, reopened) = open_cache(&path, "portfolio-cache", clock);
    assert_eq!(reopened.get::<Value>("projects"), Some(json!(["folio"])));
    assert_eq!(reopened.get::<Value>("blog-list"), Some(json!([1])));
}
