//! # CrawlLS Cache
//!
//! Content-addressed storage for pages rendered to Markdown.
//!
//! Every URL maps to exactly one file, `<sha256(url)>.md`, under a cache root
//! chosen at startup. Entries are write-once: nothing in this crate expires,
//! refreshes or deletes them. Refreshing a page means removing its file (or the
//! whole directory) by hand.
//!
//! ## Features
//!
//! - **Deterministic paths**: the same URL always lands on the same file
//! - **Atomic writes**: entries appear fully written or not at all
//! - **Per-key locks**: concurrent resolutions of one URL fetch it once

pub mod cache;
pub mod error;

pub use cache::{cache_key, ContentCache, EntryGuard, CACHE_EXTENSION};
pub use error::CacheError;

/// Re-export commonly used types
pub type Result<T> = std::result::Result<T, CacheError>;
