//! Folio - content core of a personal portfolio site
//!
//! Provides a lightweight Markdown renderer, a TTL cache over a pluggable
//! key-value store, and cached fetching of the site's JSON data files.

pub mod cache;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod fetch;
pub mod markdown;
pub mod storage;

pub use cache::{CacheConfig, CacheStats, TtlCache};
pub use config::Config;
pub use content::{load_blogs, validate_blogs, BlogPost};
pub use error::{CacheError, FetchError};
pub use fetch::{ContentFetcher, FetchOptions};
pub use markdown::{render, MarkdownRenderer};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
