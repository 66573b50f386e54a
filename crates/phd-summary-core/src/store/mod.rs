//! Storage abstraction for chapter documents.
//!
//! The [`Store`] trait defines every persistence operation the chapter
//! service needs, so the HTTP layer and CLI can run against SQLite in
//! production and the in-memory backend in tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Chapter, ChapterDocument, ChapterId};

/// Distinct tag values across all chapters.
pub type TagSet = BTreeSet<String>;

/// Abstract storage backend for chapters.
///
/// Identities are generated by the backend on insert; callers never pick
/// them. Documents passed in are already normalized.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_chapter`](Store::insert_chapter) | Persist a new chapter, returning its generated id |
/// | [`get_chapter`](Store::get_chapter) | Fetch one chapter by id |
/// | [`list_chapters`](Store::list_chapters) | Fetch every chapter |
/// | [`update_chapter`](Store::update_chapter) | Replace a chapter's document, returning the matched count |
/// | [`distinct_tags`](Store::distinct_tags) | Set union of all chapters' tags |
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a new chapter and return the identity assigned to it.
    async fn insert_chapter(&self, doc: &ChapterDocument) -> Result<ChapterId>;

    /// Fetch a chapter, or `None` if no record has this id.
    async fn get_chapter(&self, id: &ChapterId) -> Result<Option<Chapter>>;

    /// Fetch all chapters. Order is backend-defined.
    async fn list_chapters(&self) -> Result<Vec<Chapter>>;

    /// Replace the document stored under `id`.
    ///
    /// Returns the number of records matched, `0` when the id is unknown.
    /// An unknown id is not an error.
    async fn update_chapter(&self, id: &ChapterId, doc: &ChapterDocument) -> Result<u64>;

    /// Every distinct tag used by any chapter.
    async fn distinct_tags(&self) -> Result<TagSet>;
}
