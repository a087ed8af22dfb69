//! Generic file-backed record storage.
//!
//! # Responsibility
//! - Define the `Record` capability and the `Storage` contract.
//! - Persist one JSON document per record under
//!   `<base_path>/<collection>/<record_id>`.
//!
//! # Invariants
//! - The on-disk file name equals the record identifier exactly.
//! - Identifiers are validated before they are joined onto a path.
//! - Absence is reported as `Ok(None)` / `Ok(false)`, never as an error.
//! - The store never wraps I/O errors; repositories add operation context.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod file_storage;
mod record_id;

pub use file_storage::FileStorage;
pub use record_id::{generate_record_id, is_valid_record_id, validate_record_id};

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by record store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Raw filesystem failure.
    Io(std::io::Error),
    /// A record could not be encoded as JSON.
    Serialize(serde_json::Error),
    /// A persisted file exists but does not decode into the record type.
    InvalidData {
        id: String,
        source: serde_json::Error,
    },
    /// `update` was called on a record without an identifier.
    MissingId,
    /// Identifier is not safe to use as a file name.
    InvalidId(String),
    /// A freshly generated identifier already names a file.
    IdCollision(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize record: {err}"),
            Self::InvalidData { id, source } => {
                write!(f, "invalid persisted record `{id}`: {source}")
            }
            Self::MissingId => write!(f, "the record doesn't have an id"),
            Self::InvalidId(id) => write!(f, "invalid record id `{id}`"),
            Self::IdCollision(id) => write!(f, "record id `{id}` is already in use"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::InvalidData { source, .. } => Some(source),
            Self::MissingId | Self::InvalidId(_) | Self::IdCollision(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// A JSON-serializable value with an optional string identifier.
///
/// The store only relies on this capability; it knows nothing else about the
/// record's shape.
pub trait Record: Serialize + DeserializeOwned {
    /// Returns the identifier, if one has been assigned.
    fn id(&self) -> Option<&str>;

    /// Replaces the identifier. Called by the store on `save`.
    fn set_id(&mut self, id: String);
}

/// Storage contract for one collection of records.
pub trait Storage<T: Record> {
    /// Persists `record` under a freshly generated identifier.
    ///
    /// Any identifier already present on `record` is discarded.
    fn save(&self, record: T) -> StoreResult<T>;

    /// Loads one record, or `None` when no file carries `id`.
    ///
    /// Identifiers that could never have been saved count as absent.
    fn load(&self, id: &str) -> StoreResult<Option<T>>;

    /// Loads every record in the collection in directory listing order.
    fn load_all(&self) -> StoreResult<Vec<T>>;

    /// Replaces an existing record wholesale.
    ///
    /// Returns `false` without writing when the record does not exist.
    fn update(&self, record: &T) -> StoreResult<bool>;

    /// Loads the record `id`, passes it through `apply` and writes the result
    /// back, all under one write lock so concurrent callers cannot interleave.
    ///
    /// The stored identifier is kept regardless of what `apply` returns.
    /// Returns `false` without writing when the record does not exist.
    fn update_with<F>(&self, id: &str, apply: F) -> StoreResult<bool>
    where
        F: FnOnce(T) -> T;

    /// Removes a record. Returns `false` when it did not exist, including
    /// for identifiers that could never have been saved.
    fn delete(&self, id: &str) -> StoreResult<bool>;
}
