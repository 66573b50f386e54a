//! # PhD Summary Core
//!
//! Shared logic for the chapter service: the chapter document model and the
//! storage abstraction with its in-memory backend.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. The SQLite backend and the HTTP surface live in
//! the `phd-summary` app crate.

pub mod models;
pub mod store;

pub use models::{Chapter, ChapterDocument, ChapterId, ChapterInput, Finding, InsertAck, Subsection};
pub use store::{Store, TagSet};
