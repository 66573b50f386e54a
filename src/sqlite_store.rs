//! SQLite-backed [`Store`] implementation.
//!
//! Each chapter is one row in the `chapters` table, with the normalized
//! [`ChapterDocument`] kept as JSON text in the `document` column. The
//! distinct-tag aggregation runs inside SQLite over `json_each`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use phd_summary_core::models::{Chapter, ChapterDocument, ChapterId};
use phd_summary_core::store::{Store, TagSet};

/// SQLite implementation of the [`Store`] trait.
///
/// Wraps a [`SqlitePool`]; the pool is owned by the caller, which closes it
/// at shutdown.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn decode_row(id: &str, document: &str) -> Result<Chapter> {
    let id: ChapterId = id
        .parse()
        .with_context(|| format!("stored chapter has malformed id: {}", id))?;
    let document: ChapterDocument = serde_json::from_str(document)
        .with_context(|| format!("stored chapter {} has malformed document", id))?;
    Ok(Chapter { id, document })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_chapter(&self, doc: &ChapterDocument) -> Result<ChapterId> {
        let id = ChapterId::generate();
        let now = chrono::Utc::now().timestamp();
        let document = serde_json::to_string(doc)?;

        sqlx::query(
            "INSERT INTO chapters (id, document, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&document)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_chapter(&self, id: &ChapterId) -> Result<Option<Chapter>> {
        let row = sqlx::query("SELECT id, document FROM chapters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let id: String = row.get("id");
                let document: String = row.get("document");
                decode_row(&id, &document).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_chapters(&self) -> Result<Vec<Chapter>> {
        let rows = sqlx::query("SELECT id, document FROM chapters ORDER BY created_at, rowid")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let document: String = row.get("document");
                decode_row(&id, &document)
            })
            .collect()
    }

    async fn update_chapter(&self, id: &ChapterId, doc: &ChapterDocument) -> Result<u64> {
        let document = serde_json::to_string(doc)?;

        let result = sqlx::query("UPDATE chapters SET document = ?, updated_at = ? WHERE id = ?")
            .bind(&document)
            .bind(chrono::Utc::now().timestamp())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn distinct_tags(&self) -> Result<TagSet> {
        let tags: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT tag.value
            FROM chapters, json_each(chapters.document, '$.tags') AS tag
            WHERE tag.type = 'text'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tags.into_iter().collect())
    }
}
