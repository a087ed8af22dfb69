//! Record identifier generation and path-safety checks.
//!
//! Identifiers are used verbatim as file names, so every id that reaches
//! the filesystem must pass `validate_record_id` first.

use super::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

const MAX_RECORD_ID_LEN: usize = 128;

static RECORD_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid record id regex"));

/// Generates a fresh random identifier (hyphenated UUID v4).
pub fn generate_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns whether `id` is safe to use as a record file name.
///
/// Accepts ASCII letters, digits, `-` and `_` up to 128 characters, which
/// rules out path separators, `.`/`..` and platform-reserved characters.
pub fn is_valid_record_id(id: &str) -> bool {
    id.len() <= MAX_RECORD_ID_LEN && RECORD_ID_RE.is_match(id)
}

/// Rejects identifiers that are not safe to use as file names.
pub fn validate_record_id(id: &str) -> StoreResult<()> {
    if is_valid_record_id(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}
