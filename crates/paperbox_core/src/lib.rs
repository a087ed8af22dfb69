//! Core persistence logic for Paperbox.
//! Records live as JSON files on disk; this crate owns both the generic
//! file store and the domain repositories layered on top of it.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use config::{AppConfig, ConfigError, StoreConfig, DEFAULT_BASE_PATH, DEFAULT_COLLECTION};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::article::Article;
pub use repo::article_repo::{ArticleRepository, RepoError, RepoResult, ARTICLE_COLLECTION};
pub use store::{
    generate_record_id, is_valid_record_id, validate_record_id, FileStorage, Record, Storage,
    StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
