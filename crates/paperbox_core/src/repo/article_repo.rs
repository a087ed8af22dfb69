//! Article repository.
//!
//! # Responsibility
//! - Expose article CRUD over any `Storage<Article>` implementation.
//! - Strip client-supplied ids and timestamps on create.
//! - Preserve `created_at` and refresh `updated_at` on update.
//!
//! # Invariants
//! - `add` persists only `title` and `content` from its input.
//! - `update` never writes when the article does not exist.
//! - `created_at <= updated_at` for every article written here.

use crate::config::StoreConfig;
use crate::model::article::{current_timestamp, Article};
use crate::store::{FileStorage, Storage, StoreError};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Collection name articles are stored under by default.
pub const ARTICLE_COLLECTION: &str = "articles";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for article operations.
#[derive(Debug)]
pub enum RepoError {
    /// `update` was called with an article that has no id.
    MissingId,
    /// The underlying store failed while running `operation`.
    Storage {
        operation: &'static str,
        source: StoreError,
    },
}

impl RepoError {
    fn storage(operation: &'static str, source: StoreError) -> Self {
        warn!(
            "event=article_{operation} module=repo status=error error={}",
            source
        );
        Self::Storage { operation, source }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "article has no id"),
            Self::Storage { operation, source } => {
                write!(f, "article {operation} failed: {source}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingId => None,
            Self::Storage { source, .. } => Some(source),
        }
    }
}

/// Article repository over a storage backend.
pub struct ArticleRepository<S: Storage<Article>> {
    storage: S,
}

impl ArticleRepository<FileStorage<Article>> {
    /// Opens the repository on the default `articles` collection.
    pub fn open(config: &StoreConfig) -> RepoResult<Self> {
        Self::open_collection(config, ARTICLE_COLLECTION)
    }

    /// Opens the repository on a custom collection under `config`.
    pub fn open_collection(config: &StoreConfig, collection: &str) -> RepoResult<Self> {
        let storage = FileStorage::new(config, collection)
            .map_err(|source| RepoError::storage("open", source))?;
        Ok(Self::new(storage))
    }
}

impl<S: Storage<Article>> ArticleRepository<S> {
    /// Creates a repository using the provided storage implementation.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the backing storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Gets one article by id; `None` when it does not exist.
    pub fn get_by_id(&self, id: &str) -> RepoResult<Option<Article>> {
        self.storage
            .load(id)
            .map_err(|source| RepoError::storage("load", source))
    }

    /// Lists every stored article in unspecified order.
    pub fn get_all(&self) -> RepoResult<Vec<Article>> {
        self.storage
            .load_all()
            .map_err(|source| RepoError::storage("list", source))
    }

    /// Creates an article from the client-writable fields of `article`.
    ///
    /// # Contract
    /// - Any id or timestamps on `article` are ignored.
    /// - `created_at == updated_at` on the returned article.
    /// - Returns the article as persisted, including its generated id.
    pub fn add(&self, article: &Article) -> RepoResult<Article> {
        let now = current_timestamp();
        let draft = Article {
            id: None,
            title: article.title.clone(),
            content: article.content.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let saved = self
            .storage
            .save(draft)
            .map_err(|source| RepoError::storage("save", source))?;
        debug!(
            "event=article_add module=repo status=ok id={}",
            saved.id.as_deref().unwrap_or_default()
        );
        Ok(saved)
    }

    /// Replaces title and content of an existing article.
    ///
    /// # Contract
    /// - Returns `Err(RepoError::MissingId)` when `article.id` is absent or empty.
    /// - Returns `Ok(false)` without writing when the article does not exist.
    /// - Keeps the stored `id` and `created_at`; sets `updated_at` to now,
    ///   clamped so it never precedes `created_at` or the stored `updated_at`.
    /// - The read and the write happen under one storage lock, so concurrent
    ///   updates of the same article apply one after the other.
    pub fn update(&self, article: &Article) -> RepoResult<bool> {
        let id = article
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(RepoError::MissingId)?;

        let updated = self
            .storage
            .update_with(id, |existing| {
                let now = current_timestamp();
                let floor = existing.updated_at.max(existing.created_at);
                let updated_at = match floor {
                    Some(floor) if floor > now => floor,
                    _ => now,
                };
                Article {
                    title: article.title.clone(),
                    content: article.content.clone(),
                    updated_at: Some(updated_at),
                    ..existing
                }
            })
            .map_err(|source| RepoError::storage("update", source))?;

        if updated {
            debug!("event=article_update module=repo status=ok id={id}");
        } else {
            debug!("event=article_update module=repo status=not_found id={id}");
        }
        Ok(updated)
    }

    /// Deletes an article. Returns `false` when it did not exist.
    pub fn delete(&self, id: &str) -> RepoResult<bool> {
        self.storage
            .delete(id)
            .map_err(|source| RepoError::storage("delete", source))
    }
}
