//! Domain records persisted through the file store.
//!
//! # Responsibility
//! - Define the serialized shape of every domain record.
//! - Expose each record's identifier to the store via `store::Record`.
//!
//! # Invariants
//! - Field names on disk are camelCase and must stay stable, since existing
//!   files are read back without migration.

pub mod article;
