//! In-memory [`Store`] implementation for testing and embedding.
//!
//! Chapters live in a `Vec` behind `std::sync::RwLock`, in insertion order.
//! Distinct tags are computed by folding every chapter's tags into a set.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Chapter, ChapterDocument, ChapterId};

use super::{Store, TagSet};

/// In-memory chapter store.
pub struct InMemoryStore {
    chapters: RwLock<Vec<Chapter>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            chapters: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Chapter>>> {
        self.chapters
            .read()
            .map_err(|_| anyhow!("in-memory chapter store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Chapter>>> {
        self.chapters
            .write()
            .map_err(|_| anyhow!("in-memory chapter store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_chapter(&self, doc: &ChapterDocument) -> Result<ChapterId> {
        let id = ChapterId::generate();
        self.write()?.push(Chapter {
            id,
            document: doc.clone(),
        });
        Ok(id)
    }

    async fn get_chapter(&self, id: &ChapterId) -> Result<Option<Chapter>> {
        Ok(self.read()?.iter().find(|c| c.id == *id).cloned())
    }

    async fn list_chapters(&self) -> Result<Vec<Chapter>> {
        Ok(self.read()?.clone())
    }

    async fn update_chapter(&self, id: &ChapterId, doc: &ChapterDocument) -> Result<u64> {
        let mut chapters = self.write()?;
        match chapters.iter_mut().find(|c| c.id == *id) {
            Some(stored) => {
                stored.document = doc.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn distinct_tags(&self) -> Result<TagSet> {
        Ok(self
            .read()?
            .iter()
            .flat_map(|c| c.document.tags.iter().cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Finding, Subsection};

    fn doc(title: &str, tags: &[&str]) -> ChapterDocument {
        ChapterDocument {
            chapter_title: title.to_string(),
            subsections: vec![Subsection {
                subsection_title: format!("{} / first", title),
                findings: vec![Finding {
                    finding_description: "observed".to_string(),
                    supporting_authors: vec!["Noether".to_string()],
                }],
            }],
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let store = InMemoryStore::new();
        let original = doc("Methods", &["stats"]);
        let id = store.insert_chapter(&original).await.unwrap();

        let fetched = store.get_chapter(&id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.document, original);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = InMemoryStore::new();
        let a = store.insert_chapter(&doc("A", &[])).await.unwrap();
        let b = store.insert_chapter(&doc("A", &[])).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list_chapters().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let store = InMemoryStore::new();
        store.insert_chapter(&doc("A", &[])).await.unwrap();
        let missing = store.get_chapter(&ChapterId::generate()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_empty() {
        let store = InMemoryStore::new();
        assert!(store.list_chapters().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_document() {
        let store = InMemoryStore::new();
        let id = store.insert_chapter(&doc("Draft", &["old"])).await.unwrap();

        let revised = ChapterDocument {
            chapter_title: "Final".to_string(),
            subsections: vec![],
            tags: vec!["new".to_string()],
            image_url: Some("/images/cover.png".to_string()),
        };
        let matched = store.update_chapter(&id, &revised).await.unwrap();
        assert_eq!(matched, 1);

        let fetched = store.get_chapter(&id).await.unwrap().unwrap();
        assert_eq!(fetched.document, revised);
    }

    #[tokio::test]
    async fn test_update_unknown_matches_nothing() {
        let store = InMemoryStore::new();
        let id = store.insert_chapter(&doc("Kept", &[])).await.unwrap();

        let matched = store
            .update_chapter(&ChapterId::generate(), &doc("Ghost", &[]))
            .await
            .unwrap();
        assert_eq!(matched, 0);

        let chapters = store.list_chapters().await.unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].id, id);
        assert_eq!(chapters[0].document.chapter_title, "Kept");
    }

    #[tokio::test]
    async fn test_distinct_tags_union() {
        let store = InMemoryStore::new();
        store.insert_chapter(&doc("One", &["a", "b"])).await.unwrap();
        store.insert_chapter(&doc("Two", &["b", "c"])).await.unwrap();
        store.insert_chapter(&doc("Three", &[])).await.unwrap();

        let tags: Vec<String> = store.distinct_tags().await.unwrap().into_iter().collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_distinct_tags_empty() {
        let store = InMemoryStore::new();
        assert!(store.distinct_tags().await.unwrap().is_empty());

        store.insert_chapter(&doc("Untagged", &[])).await.unwrap();
        assert!(store.distinct_tags().await.unwrap().is_empty());
    }
}
