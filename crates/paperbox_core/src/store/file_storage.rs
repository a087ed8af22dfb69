//! Directory-per-collection, file-per-record storage.
//!
//! # Responsibility
//! - Map `Storage` operations onto plain files in one collection directory.
//! - Serialize check-then-write sequences between in-process callers.
//!
//! # Invariants
//! - Record files are replaced by rename, never rewritten in place.
//! - `save` never overwrites an existing file.
//! - `update` never creates a file that did not exist.
//! - All writers of one collection directory share the same lock, no matter
//!   how many `FileStorage` values point at it. Other processes are not
//!   coordinated.

use super::record_id::{generate_record_id, is_valid_record_id, validate_record_id};
use super::{Record, Storage, StoreError, StoreResult};
use crate::config::StoreConfig;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

type CollectionLock = Arc<Mutex<()>>;

static COLLECTION_LOCKS: Lazy<Mutex<HashMap<PathBuf, CollectionLock>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// File-backed store for records of type `T` in a single collection.
pub struct FileStorage<T> {
    collection: String,
    dir: PathBuf,
    lock: CollectionLock,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> FileStorage<T> {
    /// Binds a store to `<config.base_path>/<collection>`.
    ///
    /// No I/O happens here; directories are created on first write.
    ///
    /// # Errors
    /// - Returns `StoreError::InvalidId` when `collection` is not a safe
    ///   directory name.
    pub fn new(config: &StoreConfig, collection: impl Into<String>) -> StoreResult<Self> {
        let collection = collection.into();
        validate_record_id(&collection)?;
        let dir = config.collection_dir(&collection);
        let lock = collection_lock(&dir);
        Ok(Self {
            collection,
            dir,
            lock,
            _record: PhantomData,
        })
    }

    /// Returns the collection name this store is bound to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the directory holding this collection's record files.
    pub fn collection_dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> StoreResult<PathBuf> {
        validate_record_id(id)?;
        Ok(self.dir.join(id))
    }

    fn lock_collection(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_record(&self, id: &str, path: &Path) -> StoreResult<Option<T>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "event=record_load module=store status=not_found collection={} id={}",
                    self.collection, id
                );
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let record = serde_json::from_slice(&bytes).map_err(|source| {
            warn!(
                "event=record_load module=store status=error collection={} id={} error_code=invalid_data",
                self.collection, id
            );
            StoreError::InvalidData {
                id: id.to_string(),
                source,
            }
        })?;
        Ok(Some(record))
    }

    /// Writes `payload` to a hidden sibling file, then renames it onto `path`,
    /// so readers see either the previous or the new content, never a prefix.
    ///
    /// Callers must hold the collection lock.
    fn write_replace(&self, id: &str, path: &Path, payload: &[u8]) -> std::io::Result<()> {
        let staging = self.dir.join(format!(".{id}.tmp"));
        let staged = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staging)
            .and_then(|mut file| {
                file.write_all(payload)?;
                file.sync_data()
            })
            .and_then(|()| fs::rename(&staging, path));
        if let Err(err) = staged {
            let _ = fs::remove_file(&staging);
            return Err(err);
        }
        Ok(())
    }
}

fn record_file_exists(path: &Path) -> std::io::Result<bool> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

impl<T: Record> Storage<T> for FileStorage<T> {
    fn save(&self, mut record: T) -> StoreResult<T> {
        let started_at = Instant::now();
        let id = generate_record_id();
        record.set_id(id.clone());
        let payload = serde_json::to_vec(&record).map_err(StoreError::Serialize)?;
        let path = self.record_path(&id)?;

        let _guard = self.lock_collection();
        fs::create_dir_all(&self.dir)?;

        if path.try_exists()? {
            warn!(
                "event=record_save module=store status=error collection={} id={} error_code=id_collision",
                self.collection, id
            );
            return Err(StoreError::IdCollision(id));
        }

        if let Err(err) = self.write_replace(&id, &path, &payload) {
            warn!(
                "event=record_save module=store status=error collection={} id={} error_code=write_failed error={}",
                self.collection, id, err
            );
            return Err(err.into());
        }

        debug!(
            "event=record_save module=store status=ok collection={} id={} bytes={} duration_ms={}",
            self.collection,
            id,
            payload.len(),
            started_at.elapsed().as_millis()
        );
        Ok(record)
    }

    fn load(&self, id: &str) -> StoreResult<Option<T>> {
        // `save` never creates a file under an unsafe name, so such ids are
        // simply absent.
        if !is_valid_record_id(id) {
            debug!(
                "event=record_load module=store status=not_found collection={} reason=invalid_id",
                self.collection
            );
            return Ok(None);
        }
        self.read_record(id, &self.dir.join(id))
    }

    fn load_all(&self) -> StoreResult<Vec<T>> {
        let started_at = Instant::now();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "event=record_load_all module=store status=ok collection={} count=0 missing_dir=true",
                    self.collection
                );
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            // Staging files (`.<id>.tmp`) and foreign files fail validation.
            let Some(id) = file_name.to_str().filter(|name| is_valid_record_id(name)) else {
                debug!(
                    "event=record_load_all module=store status=skip collection={} reason=foreign_file",
                    self.collection
                );
                continue;
            };
            // A file removed between listing and reading is simply absent.
            if let Some(record) = self.read_record(id, &entry.path())? {
                records.push(record);
            }
        }

        debug!(
            "event=record_load_all module=store status=ok collection={} count={} duration_ms={}",
            self.collection,
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    fn update(&self, record: &T) -> StoreResult<bool> {
        let id = record
            .id()
            .filter(|id| !id.is_empty())
            .ok_or(StoreError::MissingId)?;
        let path = self.record_path(id)?;
        let payload = serde_json::to_vec(record).map_err(StoreError::Serialize)?;

        let _guard = self.lock_collection();
        if !record_file_exists(&path)? {
            debug!(
                "event=record_update module=store status=not_found collection={} id={}",
                self.collection, id
            );
            return Ok(false);
        }

        self.write_replace(id, &path, &payload)?;
        debug!(
            "event=record_update module=store status=ok collection={} id={} bytes={}",
            self.collection,
            id,
            payload.len()
        );
        Ok(true)
    }

    fn update_with<F>(&self, id: &str, apply: F) -> StoreResult<bool>
    where
        F: FnOnce(T) -> T,
    {
        if id.is_empty() {
            return Err(StoreError::MissingId);
        }
        let path = self.record_path(id)?;

        let _guard = self.lock_collection();
        let Some(existing) = self.read_record(id, &path)? else {
            return Ok(false);
        };

        let mut updated = apply(existing);
        updated.set_id(id.to_string());
        let payload = serde_json::to_vec(&updated).map_err(StoreError::Serialize)?;

        self.write_replace(id, &path, &payload)?;
        debug!(
            "event=record_update module=store status=ok collection={} id={} bytes={} mode=read_modify_write",
            self.collection,
            id,
            payload.len()
        );
        Ok(true)
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        if !is_valid_record_id(id) {
            debug!(
                "event=record_delete module=store status=not_found collection={} reason=invalid_id",
                self.collection
            );
            return Ok(false);
        }
        let path = self.dir.join(id);

        let _guard = self.lock_collection();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(
                    "event=record_delete module=store status=ok collection={} id={}",
                    self.collection, id
                );
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "event=record_delete module=store status=not_found collection={} id={}",
                    self.collection, id
                );
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn collection_lock(dir: &Path) -> CollectionLock {
    let mut locks = COLLECTION_LOCKS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(locks.entry(dir.to_path_buf()).or_default())
}
