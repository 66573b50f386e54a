//! Integration tests for the SQLite chapter store.
//!
//! These run the real schema in a temporary database and drive it both
//! directly through the `Store` trait and through `ChapterService`.

use std::sync::Arc;
use std::time::Duration;

use phd_summary::config::Config;
use phd_summary::models::{ChapterDocument, ChapterId, ChapterInput, Finding, Subsection};
use phd_summary::sqlite_store::SqliteStore;
use phd_summary::store::Store;
use phd_summary::{db, migrate, ChapterError, ChapterService};
use serde_json::json;
use tempfile::TempDir;

// ─── Helpers ────────────────────────────────────────────────────────

fn test_config(tmp: &TempDir) -> Config {
    let root = tmp.path();
    let config_content = format!(
        r#"
[db]
path = "{}"

[uploads]
dir = "{}"
"#,
        root.join("data").join("chapters.sqlite").display(),
        root.join("images").display()
    );
    toml::from_str(&config_content).unwrap()
}

async fn open_store(tmp: &TempDir) -> (SqliteStore, sqlx::SqlitePool) {
    let cfg = test_config(tmp);
    migrate::run_migrations(&cfg).await.unwrap();
    let pool = db::connect(&cfg).await.unwrap();
    (SqliteStore::new(pool.clone()), pool)
}

fn sample_input(title: &str, tags: Option<Vec<&str>>) -> ChapterInput {
    let mut payload = json!({
        "chapterTitle": title,
        "subsections": [
            {
                "subsectionTitle": "Motivation",
                "findings": [
                    { "findingDescription": "gap in literature", "supportingAuthors": ["Hopper", "Lovelace"] },
                    { "findingDescription": "prior model fails", "supportingAuthors": ["Turing"] }
                ]
            },
            {
                "subsectionTitle": "Scope",
                "findings": []
            }
        ]
    });
    if let Some(tags) = tags {
        payload["tags"] = json!(tags);
    }
    serde_json::from_value(payload).unwrap()
}

// ─── Store ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_migrations_idempotent() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    migrate::run_migrations(&cfg).await.unwrap();
    migrate::run_migrations(&cfg).await.unwrap();
}

#[tokio::test]
async fn test_sqlite_roundtrip_preserves_nesting() {
    let tmp = TempDir::new().unwrap();
    let (store, pool) = open_store(&tmp).await;

    let doc = sample_input("Introduction", Some(vec!["ml", "theory"])).normalize();
    let id = store.insert_chapter(&doc).await.unwrap();

    let fetched = store.get_chapter(&id).await.unwrap().unwrap();
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.document, doc);
    assert_eq!(
        fetched.document.subsections[0].findings[1],
        Finding {
            finding_description: "prior model fails".to_string(),
            supporting_authors: vec!["Turing".to_string()],
        }
    );

    pool.close().await;
}

#[tokio::test]
async fn test_sqlite_list_counts() {
    let tmp = TempDir::new().unwrap();
    let (store, pool) = open_store(&tmp).await;

    assert!(store.list_chapters().await.unwrap().is_empty());

    for i in 0..3 {
        store
            .insert_chapter(&sample_input(&format!("Chapter {}", i), None).normalize())
            .await
            .unwrap();
    }

    let all = store.list_chapters().await.unwrap();
    assert_eq!(all.len(), 3);

    pool.close().await;
}

#[tokio::test]
async fn test_sqlite_distinct_tags() {
    let tmp = TempDir::new().unwrap();
    let (store, pool) = open_store(&tmp).await;

    assert!(store.distinct_tags().await.unwrap().is_empty());

    store
        .insert_chapter(&sample_input("One", Some(vec!["a", "b"])).normalize())
        .await
        .unwrap();
    store
        .insert_chapter(&sample_input("Two", Some(vec!["b", "c"])).normalize())
        .await
        .unwrap();
    store
        .insert_chapter(&sample_input("Three", None).normalize())
        .await
        .unwrap();

    let tags: Vec<String> = store.distinct_tags().await.unwrap().into_iter().collect();
    assert_eq!(tags, vec!["a", "b", "c"]);

    pool.close().await;
}

#[tokio::test]
async fn test_sqlite_update_counts_matches() {
    let tmp = TempDir::new().unwrap();
    let (store, pool) = open_store(&tmp).await;

    let id = store
        .insert_chapter(&sample_input("Draft", Some(vec!["old"])).normalize())
        .await
        .unwrap();

    let revised = ChapterDocument {
        chapter_title: "Revised".to_string(),
        subsections: vec![Subsection {
            subsection_title: "Only".to_string(),
            findings: vec![],
        }],
        tags: vec!["new".to_string()],
        image_url: Some("/images/cover.png".to_string()),
    };

    assert_eq!(store.update_chapter(&id, &revised).await.unwrap(), 1);
    assert_eq!(
        store.get_chapter(&id).await.unwrap().unwrap().document,
        revised
    );

    let ghost = ChapterId::generate();
    assert_eq!(store.update_chapter(&ghost, &revised).await.unwrap(), 0);
    assert!(store.get_chapter(&ghost).await.unwrap().is_none());
    assert_eq!(store.list_chapters().await.unwrap().len(), 1);

    pool.close().await;
}

// ─── Service over SQLite ────────────────────────────────────────────

#[tokio::test]
async fn test_service_create_get_update() {
    let tmp = TempDir::new().unwrap();
    let (store, pool) = open_store(&tmp).await;
    let svc = ChapterService::new(Arc::new(store), Duration::from_secs(10));

    let ack = svc.create(sample_input("Methods", None)).await.unwrap();
    let id = ack.inserted_id.to_string();

    let created = svc.get(&id).await.unwrap();
    assert_eq!(created.document.chapter_title, "Methods");
    assert!(created.document.tags.is_empty());
    assert_eq!(created.document.subsections.len(), 2);

    let payload = sample_input("Methods (revised)", Some(vec!["stats", "stats"]));
    let echoed = svc.update(&id, payload.clone()).await.unwrap();
    assert_eq!(echoed, payload.normalize());

    let updated = svc.get(&id).await.unwrap();
    assert_eq!(updated.document, echoed);

    let tags: Vec<String> = svc.distinct_tags().await.unwrap().into_iter().collect();
    assert_eq!(tags, vec!["stats"]);

    pool.close().await;
}

#[tokio::test]
async fn test_service_missing_and_malformed_ids() {
    let tmp = TempDir::new().unwrap();
    let (store, pool) = open_store(&tmp).await;
    let svc = ChapterService::new(Arc::new(store), Duration::from_secs(10));

    let err = svc.get("5f1d7e2a9c1b2a3d4e5f6a7b").await.unwrap_err();
    assert!(matches!(err, ChapterError::NotFound(_)));

    let err = svc
        .get(&ChapterId::generate().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ChapterError::NotFound(_)));

    // Updates of ids that match nothing succeed without writing
    svc.update(&ChapterId::generate().to_string(), sample_input("x", None))
        .await
        .unwrap();
    svc.update("not-an-id", sample_input("y", None))
        .await
        .unwrap();
    assert!(svc.list().await.unwrap().is_empty());

    pool.close().await;
}
