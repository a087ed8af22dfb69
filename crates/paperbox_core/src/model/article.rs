//! Article domain model.
//!
//! # Responsibility
//! - Define the article record and its on-disk JSON shape.
//! - Provide timestamp helpers shared by the article repository.
//!
//! # Invariants
//! - `id` is `None` until the store assigns one and never changes afterwards.
//! - `created_at <= updated_at` once the article has been persisted.

use crate::store::Record;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Article record as stored in `<base>/articles/<id>`.
///
/// Timestamps are serialized as RFC 3339 strings and parsed back into
/// `DateTime<Utc>` on read, so callers always see structured dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Store-generated identifier; doubles as the file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Set once by the repository when the article is added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Refreshed by the repository on every successful update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Creates an unsaved article carrying only client-writable fields.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Returns whether the store has assigned an identifier.
    pub fn is_persisted(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

impl Record for Article {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

/// Current time truncated to millisecond precision.
///
/// Millisecond precision matches timestamps written by earlier clients and
/// keeps `load(save(x)) == save(x)` exact across serialization.
pub(crate) fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
