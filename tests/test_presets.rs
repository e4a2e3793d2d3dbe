use chrono::TimeDelta;
use dns_query_filter::clock::FixedClock;
use dns_query_filter::presets::{
    FilterPreset, HISTORY_KEY, PRESETS_KEY, PresetError, PresetStore, SearchHistory,
    decode_share_link, share_link,
};
use dns_query_filter::state::{FileStore, FilterState, KeyValueStore, MemoryStore, StorageError};
use dns_query_filter::{Operator, Rule, RuleTree};
use std::cell::Cell;
use std::io;
use std::rc::Rc;
use tempfile::TempDir;

fn clock() -> FixedClock {
    FixedClock::parse("2026-10-18T12:00:00Z").unwrap()
}

fn mx_state() -> FilterState {
    FilterState {
        query: RuleTree::and([Rule::new("type", Operator::Eq, "MX").into()]),
        search_term: "mail".into(),
        ..FilterState::default()
    }
}

#[test]
fn test_save_list_and_delete() {
    let store = MemoryStore::new();
    let mut presets = PresetStore::load(store.clone()).unwrap();
    assert!(presets.presets().is_empty());

    let id = presets
        .save_filter(
            FilterPreset::new("Mail exchangers", mx_state(), &clock())
                .description("All MX records")
                .tags(["mail", "prod"]),
        )
        .unwrap()
        .id
        .clone();
    presets
        .save_filter(FilterPreset::new("Mail exchangers", FilterState::default(), &clock()))
        .unwrap();
    assert_eq!(presets.presets().len(), 2);

    let reloaded = PresetStore::load(store.clone()).unwrap();
    assert_eq!(reloaded.presets(), presets.presets());
    assert_eq!(reloaded.get(&id).unwrap().query, mx_state());

    assert!(presets.delete_filter(&id).unwrap());
    assert_eq!(presets.presets().len(), 1);
    assert!(PresetStore::load(store).unwrap().get(&id).is_none());
}

#[test]
fn test_delete_unknown_id_is_a_no_op() {
    let store = MemoryStore::new();
    let mut presets = PresetStore::load(store.clone()).unwrap();
    presets
        .save_filter(FilterPreset::new("Keep me", mx_state(), &clock()))
        .unwrap();
    let before = store.get(PRESETS_KEY).unwrap();

    assert!(!presets.delete_filter("no-such-id").unwrap());
    assert_eq!(presets.presets().len(), 1);
    assert_eq!(store.get(PRESETS_KEY).unwrap(), before);
}

#[test]
fn test_preset_ids_are_unique() {
    let a = FilterPreset::new("Same", FilterState::default(), &clock());
    let b = FilterPreset::new("Same", FilterState::default(), &clock());
    assert_ne!(a.id, b.id);
    assert_eq!(a.created_at, clock().0);
    assert_eq!(a.updated_at, a.created_at);
}

#[test]
fn test_preset_is_a_snapshot() {
    let mut state = mx_state();
    let preset = FilterPreset::new("Snapshot", state.clone(), &clock());
    state.search_term = "changed later".into();
    assert_eq!(preset.query.search_term, "mail");
}

#[test]
fn test_corrupt_saved_filters_load_as_empty() {
    let mut store = MemoryStore::new();
    store.set(PRESETS_KEY, "{ definitely not a list").unwrap();
    let presets = PresetStore::load(store).unwrap();
    assert!(presets.presets().is_empty());
}

#[test]
fn test_export_then_import() {
    let mut source = PresetStore::load(MemoryStore::new()).unwrap();
    let id = source
        .save_filter(FilterPreset::new("Mail / MX", mx_state(), &clock()).public(true))
        .unwrap()
        .id
        .clone();

    let artifact = source.export_preset(&id).unwrap();
    assert_eq!(artifact.filename, "filter-mail---mx.json");
    assert_eq!(artifact.mime_type, "application/json");

    let mut target = PresetStore::load(MemoryStore::new()).unwrap();
    let imported = target.import_preset(&artifact.bytes).unwrap();
    assert_eq!(imported.name, "Mail / MX");
    assert!(imported.is_public);
    assert_eq!(imported.query, mx_state());
}

#[test]
fn test_export_unknown_id() {
    let presets = PresetStore::load(MemoryStore::new()).unwrap();
    assert!(matches!(
        presets.export_preset("missing"),
        Err(PresetError::NotFound(id)) if id == "missing"
    ));
}

#[test]
fn test_import_is_all_or_nothing() {
    let store = MemoryStore::new();
    let mut presets = PresetStore::load(store.clone()).unwrap();
    presets
        .save_filter(FilterPreset::new("Existing", mx_state(), &clock()))
        .unwrap();
    let before = store.get(PRESETS_KEY).unwrap();

    let bad_inputs: [&[u8]; 3] = [
        b"not json at all",
        br#"{"name": "missing id and query"}"#,
        br#"{"id": "x", "name": "bad dates", "query": {}, "createdAt": "yesterday", "updatedAt": "today"}"#,
    ];
    for input in bad_inputs {
        let err = presets.import_preset(input).unwrap_err();
        assert!(matches!(err, PresetError::InvalidPreset(_)));
    }

    assert_eq!(presets.presets().len(), 1);
    assert_eq!(store.get(PRESETS_KEY).unwrap(), before);
}

#[test]
fn test_presets_persist_to_files() {
    let dir = TempDir::new().unwrap();
    let mut presets = PresetStore::load(FileStore::new(dir.path())).unwrap();
    presets
        .save_filter(FilterPreset::new("On disk", mx_state(), &clock()))
        .unwrap();

    assert!(dir.path().join(format!("{PRESETS_KEY}.json")).exists());
    let reloaded = PresetStore::load(FileStore::new(dir.path())).unwrap();
    assert_eq!(reloaded.presets()[0].name, "On disk");
}

#[test]
fn test_share_link_round_trip() {
    let preset = FilterPreset::new("Shared MX", mx_state(), &clock());
    let link = share_link(&preset, "https://dns.example.net", "");
    assert!(link.starts_with("https://dns.example.net/filters/shared/"));

    let shared = decode_share_link(&link).unwrap();
    assert_eq!(shared.id, preset.id);
    assert_eq!(shared.name, "Shared MX");
    assert_eq!(shared.query, mx_state());
}

#[test]
fn test_history_keeps_newest_hundred() {
    let store = MemoryStore::new();
    let mut history = SearchHistory::load(store.clone(), 100).unwrap();
    let start = clock().0;

    for i in 0..150 {
        let at = FixedClock(start + TimeDelta::seconds(i));
        history
            .add_to_history(&format!("query {i}"), i as usize, &at)
            .unwrap();
    }

    assert_eq!(history.len(), 100);
    let entries = history.entries();
    assert_eq!(entries[0].query, "query 149");
    assert_eq!(entries[99].query, "query 50");
    assert!(entries.windows(2).all(|w| w[0].timestamp > w[1].timestamp));

    let reloaded = SearchHistory::load(store, 100).unwrap();
    assert_eq!(reloaded.entries(), entries);
}

#[test]
fn test_history_limit_is_configurable() {
    let mut history = SearchHistory::load(MemoryStore::new(), 3).unwrap();
    for query in ["one", "two", "three", "four"] {
        history.add_to_history(query, 0, &clock()).unwrap();
    }
    let queries: Vec<&str> = history.entries().iter().map(|e| e.query.as_str()).collect();
    assert_eq!(queries, vec!["four", "three", "two"]);

    let smaller = SearchHistory::load(MemoryStore::new(), 0).unwrap();
    assert!(smaller.is_empty());
}

#[test]
fn test_clear_history() {
    let store = MemoryStore::new();
    let mut history = SearchHistory::load(store.clone(), 100).unwrap();
    let entry = history.add_to_history("MX records", 4, &clock()).unwrap();
    assert_eq!(entry.result_count, 4);
    assert_eq!(entry.timestamp, clock().0);
    assert!(store.get(HISTORY_KEY).unwrap().is_some());

    history.clear_history().unwrap();
    assert!(history.is_empty());
    assert!(store.get(HISTORY_KEY).unwrap().is_none());
}

/// Memory store whose writes can be switched off.
#[derive(Clone, Default)]
struct ReadOnlyAfter {
    inner: MemoryStore,
    locked: Rc<Cell<bool>>,
}

impl KeyValueStore for ReadOnlyAfter {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.locked.get() {
            return Err(StorageError::Io {
                path: key.to_string(),
                source: io::Error::other("storage is read-only"),
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

#[test]
fn test_failed_history_write_keeps_the_log() {
    let store = ReadOnlyAfter::default();
    let mut history = SearchHistory::load(store.clone(), 2).unwrap();
    history.add_to_history("A records", 3, &clock()).unwrap();
    history.add_to_history("MX records", 1, &clock()).unwrap();
    let before = history.entries().to_vec();

    store.locked.set(true);
    let err = history.add_to_history("TXT records", 5, &clock()).unwrap_err();
    assert!(matches!(err, PresetError::Storage(_)));

    assert_eq!(history.entries(), before.as_slice());
    let reloaded = SearchHistory::load(store, 2).unwrap();
    assert_eq!(reloaded.entries(), before.as_slice());
}
