use paperbox_core::{FileStorage, Record, Storage, StoreConfig, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
}

impl Entry {
    fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl Record for Entry {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

fn open_store(root: &tempfile::TempDir) -> FileStorage<Entry> {
    let config = StoreConfig::new(root.path().join("storage"));
    FileStorage::new(&config, "tests").unwrap()
}

#[test]
fn save_creates_file_named_by_generated_id() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    let saved = store.save(Entry::named("test")).unwrap();
    let id = saved.id.clone().unwrap();

    let path = root.path().join("storage").join("tests").join(&id);
    assert!(path.is_file());

    let on_disk: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk["name"], "test");
    assert_eq!(on_disk["id"], id.as_str());
}

#[test]
fn save_replaces_input_id() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    let input = Entry {
        id: Some("client-chosen".to_string()),
        name: "a".to_string(),
    };
    let saved = store.save(input).unwrap();

    assert_ne!(saved.id.as_deref(), Some("client-chosen"));
    assert!(uuid::Uuid::parse_str(saved.id.as_deref().unwrap()).is_ok());
    assert!(store.load("client-chosen").unwrap().is_none());
}

#[test]
fn load_roundtrips_saved_record() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    let saved = store.save(Entry::named("test")).unwrap();
    let loaded = store.load(saved.id.as_deref().unwrap()).unwrap().unwrap();

    assert_eq!(loaded, saved);
}

#[test]
fn load_missing_record_returns_none() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    assert!(store.load("500").unwrap().is_none());
}

#[test]
fn load_all_returns_every_saved_record() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    let saved: HashSet<Entry> = ["a", "b", "c"]
        .into_iter()
        .map(|name| store.save(Entry::named(name)).unwrap())
        .collect();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.into_iter().collect::<HashSet<_>>(), saved);
}

#[test]
fn load_all_on_uninitialized_collection_is_empty() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    assert!(store.load_all().unwrap().is_empty());
    assert!(!store.collection_dir().exists());
}

#[test]
fn load_all_skips_foreign_entries() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);
    store.save(Entry::named("a")).unwrap();

    fs::write(store.collection_dir().join("notes.txt"), b"not a record").unwrap();
    fs::create_dir(store.collection_dir().join("nested")).unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, "a");
}

#[test]
fn corrupt_record_surfaces_invalid_data() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);
    store.save(Entry::named("a")).unwrap();
    fs::write(store.collection_dir().join("broken"), b"{not json").unwrap();

    let err = store.load("broken").unwrap_err();
    assert!(matches!(err, StoreError::InvalidData { ref id, .. } if id == "broken"));

    let err = store.load_all().unwrap_err();
    assert!(matches!(err, StoreError::InvalidData { .. }));
}

#[test]
fn update_overwrites_existing_record() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    let saved = store.save(Entry::named("a")).unwrap();
    let id = saved.id.clone().unwrap();

    let updated = store
        .update(&Entry {
            name: "new a".to_string(),
            ..saved
        })
        .unwrap();
    assert!(updated);

    let loaded = store.load(&id).unwrap().unwrap();
    assert_eq!(loaded.id.as_deref(), Some(id.as_str()));
    assert_eq!(loaded.name, "new a");
}

#[test]
fn update_unknown_id_returns_false_and_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);
    store.save(Entry::named("a")).unwrap();

    let updated = store
        .update(&Entry {
            id: Some("500".to_string()),
            name: "new a".to_string(),
        })
        .unwrap();

    assert!(!updated);
    assert!(!store.collection_dir().join("500").exists());
    assert_eq!(store.load_all().unwrap().len(), 1);
}

#[test]
fn update_without_id_is_an_error() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    let err = store.update(&Entry::named("a")).unwrap_err();
    assert!(matches!(err, StoreError::MissingId));

    let err = store
        .update(&Entry {
            id: Some(String::new()),
            name: "a".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingId));
}

#[test]
fn delete_removes_file() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    let saved = store.save(Entry::named("a")).unwrap();
    let id = saved.id.unwrap();

    assert!(store.delete(&id).unwrap());
    assert!(store.load(&id).unwrap().is_none());
    assert!(!store.collection_dir().join(&id).exists());
}

#[test]
fn delete_missing_record_returns_false() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    assert!(!store.delete("500").unwrap());
    store.save(Entry::named("a")).unwrap();
    assert!(!store.delete("500").unwrap());
}

#[test]
fn unsafe_ids_are_absent_and_never_reach_the_filesystem() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);
    let secret = root.path().join("storage").join("secret");
    fs::create_dir_all(secret.parent().unwrap()).unwrap();
    fs::write(&secret, br#"{"name":"secret"}"#).unwrap();

    assert!(store.load("../secret").unwrap().is_none());
    assert!(!store.delete("../secret").unwrap());
    let err = store
        .update(&Entry {
            id: Some("../secret".to_string()),
            name: "pwned".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidId(_)));

    assert!(secret.is_file());
    assert_eq!(fs::read(&secret).unwrap(), br#"{"name":"secret"}"#);
}

#[test]
fn collections_are_isolated() {
    let root = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(root.path());
    let left = FileStorage::<Entry>::new(&config, "left").unwrap();
    let right = FileStorage::<Entry>::new(&config, "right").unwrap();

    let saved = left.save(Entry::named("a")).unwrap();

    assert!(right.load(saved.id.as_deref().unwrap()).unwrap().is_none());
    assert!(right.load_all().unwrap().is_empty());
    assert_eq!(left.load_all().unwrap().len(), 1);
}

#[test]
fn records_survive_reopening_the_store() {
    let root = tempfile::tempdir().unwrap();
    let saved = open_store(&root).save(Entry::named("persisted")).unwrap();

    let reopened = open_store(&root);
    let loaded = reopened.load(saved.id.as_deref().unwrap()).unwrap();
    assert_eq!(loaded, Some(saved));
}

#[test]
fn concurrent_saves_from_separate_handles_are_all_persisted() {
    let root = tempfile::tempdir().unwrap();
    let config = Arc::new(StoreConfig::new(root.path()));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let config = Arc::clone(&config);
            thread::spawn(move || {
                let store = FileStorage::<Entry>::new(&config, "shared").unwrap();
                for index in 0..10 {
                    store
                        .save(Entry::named(&format!("w{worker}-{index}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = FileStorage::<Entry>::new(&config, "shared").unwrap();
    assert_eq!(store.load_all().unwrap().len(), 80);
}

#[test]
fn update_replaces_file_without_leaving_staging_files() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);
    let saved = store.save(Entry::named("a")).unwrap();

    for round in 0..3 {
        assert!(store
            .update(&Entry {
                name: format!("round {round}"),
                ..saved.clone()
            })
            .unwrap());
    }

    let names: Vec<String> = fs::read_dir(store.collection_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec![saved.id.clone().unwrap()]);
}

#[test]
fn readers_never_observe_partially_written_records() {
    let root = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(root.path());
    let writer = FileStorage::<Entry>::new(&config, "torn").unwrap();
    let reader = FileStorage::<Entry>::new(&config, "torn").unwrap();

    let big_name = "x".repeat(100 * 1024);
    let saved = writer.save(Entry::named(&big_name)).unwrap();
    let id = saved.id.clone().unwrap();

    let updates = thread::spawn(move || {
        for _ in 0..300 {
            assert!(writer.update(&saved).unwrap());
        }
    });

    let mut reads = 0;
    while !updates.is_finished() || reads == 0 {
        match reader.load(&id) {
            Ok(Some(entry)) => assert_eq!(entry.name.len(), big_name.len()),
            Ok(None) => panic!("record vanished during update"),
            Err(err) => panic!("read a partially written record: {err}"),
        }
        assert_eq!(reader.load_all().unwrap().len(), 1);
        reads += 1;
    }
    updates.join().unwrap();
}

#[test]
fn update_with_applies_change_and_keeps_id() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);
    let saved = store.save(Entry::named("a")).unwrap();
    let id = saved.id.clone().unwrap();

    let updated = store
        .update_with(&id, |entry| Entry {
            id: Some("hijacked".to_string()),
            name: format!("{}!", entry.name),
        })
        .unwrap();
    assert!(updated);

    let loaded = store.load(&id).unwrap().unwrap();
    assert_eq!(loaded.id.as_deref(), Some(id.as_str()));
    assert_eq!(loaded.name, "a!");
    assert!(store.load("hijacked").unwrap().is_none());
}

#[test]
fn update_with_on_unknown_id_does_not_call_closure() {
    let root = tempfile::tempdir().unwrap();
    let store = open_store(&root);

    let updated = store
        .update_with("500", |_| panic!("closure must not run"))
        .unwrap();
    assert!(!updated);
    assert!(!store.collection_dir().join("500").exists());

    assert!(matches!(
        store.update_with("", |entry| entry),
        Err(StoreError::MissingId)
    ));
    assert!(matches!(
        store.update_with("../x", |entry| entry),
        Err(StoreError::InvalidId(_))
    ));
}

#[test]
fn concurrent_update_with_loses_no_changes() {
    let root = tempfile::tempdir().unwrap();
    let config = Arc::new(StoreConfig::new(root.path()));
    let seed = FileStorage::<Entry>::new(&config, "counter").unwrap();
    let id = seed.save(Entry::named("0")).unwrap().id.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let config = Arc::clone(&config);
            let id = id.clone();
            thread::spawn(move || {
                let store = FileStorage::<Entry>::new(&config, "counter").unwrap();
                for _ in 0..25 {
                    let updated = store
                        .update_with(&id, |entry| Entry {
                            name: (entry.name.parse::<u32>().unwrap() + 1).to_string(),
                            ..entry
                        })
                        .unwrap();
                    assert!(updated);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(seed.load(&id).unwrap().unwrap().name, "200");
}
