//! Domain repositories layered over the record store.
//!
//! # Responsibility
//! - Decide which record fields are client-writable.
//! - Maintain derived fields such as timestamps.
//! - Attach operation context to storage failures.
//!
//! # Invariants
//! - Repositories never touch the filesystem directly; all persistence goes
//!   through `store::Storage`.
//! - "Not found" is returned as `None` / `false`, never as an error.

pub mod article_repo;
