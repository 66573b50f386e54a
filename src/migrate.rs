use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Open the configured database, create the schema, and close the pool.
///
/// Used by `phd-summary init`. Safe to run repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let result = apply(&pool).await;
    pool.close().await;
    result
}

/// Create the chapter schema on an existing pool if it is missing.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // One row per chapter; `document` is the normalized chapter JSON
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chapters (
            id TEXT PRIMARY KEY,
            document TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chapters_created_at ON chapters(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}
