//! Chapter operations shared by the HTTP server and the CLI.
//!
//! [`ChapterService`] sits between callers and a [`Store`]: it normalizes
//! client payloads, bounds every store call with the configured timeout,
//! and turns missing records into [`ChapterError::NotFound`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use phd_summary_core::models::{Chapter, ChapterDocument, ChapterId, ChapterInput, InsertAck};
use phd_summary_core::store::{Store, TagSet};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum ChapterError {
    #[error("chapter not found: {0}")]
    NotFound(String),
    #[error("{0:#}")]
    Backend(#[from] anyhow::Error),
    #[error("store call timed out after {0:?}")]
    TimedOut(Duration),
}

pub type ChapterResult<T> = std::result::Result<T, ChapterError>;

/// Chapter CRUD and tag aggregation over an injected store.
#[derive(Clone)]
pub struct ChapterService {
    store: Arc<dyn Store>,
    timeout: Duration,
}

impl ChapterService {
    pub fn new(store: Arc<dyn Store>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T, F>(&self, call: F) -> ChapterResult<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(ChapterError::Backend),
            Err(_) => Err(ChapterError::TimedOut(self.timeout)),
        }
    }

    /// Persist a new chapter. Missing tags are stored as `[]`.
    pub async fn create(&self, input: ChapterInput) -> ChapterResult<InsertAck> {
        let doc = input.normalize();
        let id = self.bounded(self.store.insert_chapter(&doc)).await?;
        tracing::info!(%id, title = %doc.chapter_title, "chapter created");
        Ok(InsertAck { inserted_id: id })
    }

    /// Fetch one chapter.
    ///
    /// A malformed id cannot name a record, so it is reported as not found.
    pub async fn get(&self, raw_id: &str) -> ChapterResult<Chapter> {
        let id: ChapterId = raw_id
            .parse()
            .map_err(|_| ChapterError::NotFound(raw_id.to_string()))?;

        self.bounded(self.store.get_chapter(&id))
            .await?
            .ok_or_else(|| ChapterError::NotFound(raw_id.to_string()))
    }

    pub async fn list(&self) -> ChapterResult<Vec<Chapter>> {
        self.bounded(self.store.list_chapters()).await
    }

    /// Replace a chapter's title, subsections, tags, and image URL.
    ///
    /// An id that matches no record (including a malformed one) still
    /// succeeds and nothing is written. The normalized input is returned as
    /// the confirmed state without re-reading the store.
    pub async fn update(&self, raw_id: &str, input: ChapterInput) -> ChapterResult<ChapterDocument> {
        let doc = input.normalize();

        let Ok(id) = raw_id.parse::<ChapterId>() else {
            tracing::warn!(id = raw_id, "update addressed a malformed chapter id");
            return Ok(doc);
        };

        let matched = self.bounded(self.store.update_chapter(&id, &doc)).await?;
        if matched == 0 {
            tracing::warn!(%id, "update matched no chapter");
        } else {
            tracing::info!(%id, matched, "chapter updated");
        }

        Ok(doc)
    }

    pub async fn distinct_tags(&self) -> ChapterResult<TagSet> {
        self.bounded(self.store.distinct_tags()).await
    }
}

/// Open the configured SQLite database and wrap it in a service.
async fn open_service(config: &Config) -> Result<(ChapterService, sqlx::SqlitePool)> {
    let pool = db::connect(config).await?;
    let store = Arc::new(SqliteStore::new(pool.clone()));
    let service = ChapterService::new(store, config.server.request_timeout());
    Ok((service, pool))
}

/// CLI entry point for `get`: prints the chapter as pretty JSON.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let (service, pool) = open_service(config).await?;
    let result = service.get(id).await;
    pool.close().await;

    let chapter = match result {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&chapter)?);
    Ok(())
}

/// CLI entry point for `list`: prints every chapter as a pretty JSON array.
pub async fn run_list(config: &Config) -> Result<()> {
    let (service, pool) = open_service(config).await?;
    let result = service.list().await;
    pool.close().await;

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}

/// CLI entry point for `tags`: prints one distinct tag per line.
pub async fn run_tags(config: &Config) -> Result<()> {
    let (service, pool) = open_service(config).await?;
    let result = service.distinct_tags().await;
    pool.close().await;

    for tag in result? {
        println!("{}", tag);
    }
    Ok(())
}
