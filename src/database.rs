use crate::config::DatabaseConfig;
use crate::error::{MangaReadError, Result};
use crate::models::*;
use crate::traits::CatalogBackend;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// SQLite-backed document store for the manga catalog.
///
/// Each record is kept as a JSON document next to the columns that the
/// catalog filters or orders on.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct MangaRow {
    id: String,
    document: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MangaRow {
    fn into_manga(self) -> Result<Manga> {
        let mut manga: Manga = serde_json::from_str(&self.document)?;
        manga.id = self.id;
        manga.created_at = Some(self.created_at);
        manga.updated_at = Some(self.updated_at);
        Ok(manga)
    }
}

fn rows_into_manga(rows: Vec<MangaRow>) -> Result<Vec<Manga>> {
    rows.into_iter().map(MangaRow::into_manga).collect()
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database: {}", config.url);

        // Extract directory path from database URL
        if let Some(path) = config.url.strip_prefix("sqlite:") {
            let path = std::path::Path::new(path.trim_start_matches("//"));
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !config.url.contains(":memory:") {
                    info!("Creating directory: {:?}", parent);
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;
        info!("Database connected successfully");
        Ok(Self { pool })
    }

    pub async fn init(&self) -> Result<()> {
        info!("Initializing database schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS manga (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL DEFAULT '',
                author_lower TEXT NOT NULL DEFAULT '',
                created_by TEXT,
                document TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                email_lower TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                display_name TEXT,
                avatar_url TEXT,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_manga_author ON manga (author_lower)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_manga_created_by ON manga (created_by)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_manga_created_at ON manga (created_at)")
            .execute(&self.pool)
            .await?;

        info!("Database schema initialized successfully");
        Ok(())
    }

    pub async fn count_manga(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM manga")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Inserts a record keeping its id; used to import seed data.
    pub async fn insert_manga(&self, manga: &Manga) -> Result<()> {
        let now = Utc::now();
        let created_at = manga.created_at.unwrap_or(now);
        let updated_at = manga.updated_at.unwrap_or(created_at);

        sqlx::query(
            r#"
            INSERT INTO manga (id, title, author, author_lower, created_by, document, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&manga.id)
        .bind(&manga.title)
        .bind(&manga.author)
        .bind(manga.author.to_lowercase())
        .bind(&manga.created_by)
        .bind(serde_json::to_string(manga)?)
        .bind(created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_manga(&self, id: &str) -> Result<Option<Manga>> {
        let row = sqlx::query_as::<_, MangaRow>(
            "SELECT id, document, created_at, updated_at FROM manga WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MangaRow::into_manga).transpose()
    }

    async fn write_manga(&self, manga: &Manga) -> Result<()> {
        let updated_at = manga.updated_at.unwrap_or_else(Utc::now);

        sqlx::query(
            r#"
            UPDATE manga
            SET title = ?, author = ?, author_lower = ?, created_by = ?, document = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&manga.title)
        .bind(&manga.author)
        .bind(manga.author.to_lowercase())
        .bind(&manga.created_by)
        .bind(serde_json::to_string(manga)?)
        .bind(updated_at)
        .bind(&manga.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogBackend for Database {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn list_all(&self) -> Result<Vec<Manga>> {
        let rows = sqlx::query_as::<_, MangaRow>(
            "SELECT id, document, created_at, updated_at FROM manga ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows_into_manga(rows)
    }

    async fn get_by_id(&self, id: &str) -> Result<Manga> {
        self.fetch_manga(id)
            .await?
            .ok_or_else(|| MangaReadError::manga_not_found(id))
    }

    async fn get_by_author(&self, author: &str) -> Result<Vec<Manga>> {
        let rows = sqlx::query_as::<_, MangaRow>(
            r#"
            SELECT id, document, created_at, updated_at FROM manga
            WHERE author_lower = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(author.to_lowercase())
        .fetch_all(&self.pool)
        .await?;

        rows_into_manga(rows)
    }

    async fn get_by_creator(&self, user_id: &str) -> Result<Vec<Manga>> {
        let rows = sqlx::query_as::<_, MangaRow>(
            r#"
            SELECT id, document, created_at, updated_at FROM manga
            WHERE created_by = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows_into_manga(rows)
    }

    async fn create(&self, payload: NewManga) -> Result<Manga> {
        let manga = Manga::from_new(Uuid::new_v4().to_string(), payload, Utc::now());
        self.insert_manga(&manga).await?;
        debug!("Created manga {} ({})", manga.title, manga.id);
        Ok(manga)
    }

    async fn update(&self, id: &str, changes: MangaUpdate) -> Result<Manga> {
        let mut manga = self.get_by_id(id).await?;
        manga.apply(changes, Utc::now());
        self.write_manga(&manga).await?;
        debug!("Updated manga {}", id);
        Ok(manga)
    }

    async fn delete(&self, id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM manga WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
