use chrono::{Duration, Utc};
use mangaread::catalog::Catalog;
use mangaread::config::DatabaseConfig;
use mangaread::database::Database;
use mangaread::memory::MemoryCatalog;
use mangaread::models::{Chapter, Manga, MangaUpdate, NewManga};
use mangaread::seed;
use mangaread::traits::CatalogBackend;
use mangaread::MangaReadError;
use std::sync::Arc;
use tempfile::TempDir;

async fn open_database(dir: &TempDir) -> Database {
    let config = DatabaseConfig {
        url: format!("sqlite:{}", dir.path().join("catalog.db").display()),
        max_connections: 1,
    };
    let db = Database::new(&config).await.unwrap();
    db.init().await.unwrap();
    db
}

fn payload(title: &str, author: &str) -> NewManga {
    NewManga {
        title: title.to_string(),
        author: author.to_string(),
        genres: vec!["Drama".to_string()],
        rating: 4.5,
        chapters: vec![Chapter {
            id: "c1".to_string(),
            chapter_number: "1".to_string(),
            title: "Start".to_string(),
            release_date: None,
            pages: vec!["page://1".to_string(), "page://2".to_string()],
        }],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_and_fetch_round_trip() {
    let dir = TempDir::new().unwrap();
    let db = open_database(&dir).await;

    let created = db.create(payload("Harbor Lights", "Mina Sato")).await.unwrap();
    assert!(!created.id.is_empty());
    assert!(created.created_at.is_some());

    let fetched = db.get_by_id(&created.id).await.unwrap();
    assert_eq!(fetched.title, "Harbor Lights");
    assert_eq!(fetched.chapters[0].pages.len(), 2);
    assert_eq!(db.count_manga().await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_id_is_not_found() {
    let dir = TempDir::new().unwrap();
    let db = open_database(&dir).await;

    let err = db.get_by_id("nope").await.unwrap_err();
    assert!(matches!(err, MangaReadError::MangaNotFound(ref id) if id == "nope"));

    let err = db.update("nope", MangaUpdate::default()).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(db.delete("nope").await.unwrap(), 0);
}

#[tokio::test]
async fn test_author_match_ignores_case() {
    let dir = TempDir::new().unwrap();
    let db = open_database(&dir).await;

    db.create(payload("One", "Mina Sato")).await.unwrap();
    db.create(payload("Two", "mina sato")).await.unwrap();
    db.create(payload("Three", "Mina Satomi")).await.unwrap();

    assert_eq!(db.get_by_author("MINA SATO").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_author_match_folds_non_ascii_like_memory_backend() {
    let dir = TempDir::new().unwrap();
    let db = open_database(&dir).await;
    let memory = MemoryCatalog::new(Vec::new());

    for backend in [&db as &dyn CatalogBackend, &memory] {
        backend.create(payload("Nocturne", "ÉMILE ÖBA")).await.unwrap();
    }

    assert_eq!(db.get_by_author("émile öba").await.unwrap().len(), 1);
    assert_eq!(memory.get_by_author("émile öba").await.unwrap().len(), 1);

    let created = db.create(payload("Aubade", "Zoë Ćirić")).await.unwrap();
    db.update(
        &created.id,
        MangaUpdate {
            author: Some("Ängel Ñúñez".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(db.get_by_author("zoë ćirić").await.unwrap().is_empty());
    assert_eq!(db.get_by_author("ÄNGEL ÑÚÑEZ").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let dir = TempDir::new().unwrap();
    let db = open_database(&dir).await;

    let now = Utc::now();
    for (id, age) in [("old", 3), ("new", 1), ("mid", 2)] {
        let mut manga = Manga::from_new(id.to_string(), payload(id, "A"), now - Duration::days(age));
        manga.updated_at = None;
        db.insert_manga(&manga).await.unwrap();
    }

    let ids: Vec<_> = db.list_all().await.unwrap().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[tokio::test]
async fn test_update_merges_and_delete_removes() {
    let dir = TempDir::new().unwrap();
    let db = open_database(&dir).await;

    let created = db.create(payload("Draft", "A")).await.unwrap();
    let updated = db
        .update(
            &created.id,
            MangaUpdate {
                title: Some("Final".to_string()),
                is_featured: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.author, "A");
    assert!(updated.updated_at >= created.updated_at);

    let stored = db.get_by_id(&created.id).await.unwrap();
    assert!(stored.is_featured);
    assert_eq!(stored.genres, vec!["Drama".to_string()]);

    assert_eq!(db.delete(&created.id).await.unwrap(), 1);
    assert!(db.get_by_id(&created.id).await.is_err());
}

#[tokio::test]
async fn test_catalog_over_sqlite_backend() {
    let dir = TempDir::new().unwrap();
    let db = open_database(&dir).await;
    for manga in seed::sample_catalog() {
        db.insert_manga(&manga).await.unwrap();
    }

    let catalog = Catalog::new(Arc::new(db));
    assert_eq!(catalog.backend_name(), "sqlite");
    assert_eq!(catalog.list_all().await.unwrap().len(), seed::sample_catalog().len());
    assert!(catalog.genres().await.unwrap().len() > 1);
}
