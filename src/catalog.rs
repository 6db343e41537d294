use crate::config::{CatalogConfig, DatabaseConfig};
use crate::database::Database;
use crate::error::Result;
use crate::library::{self, LibraryQuery};
use crate::memory::MemoryCatalog;
use crate::models::{Manga, MangaUpdate, NewManga};
use crate::seed;
use crate::traits::CatalogBackend;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Catalog access layer. The backend is chosen once and kept for the
/// lifetime of the catalog.
#[derive(Clone)]
pub struct Catalog {
    backend: Arc<dyn CatalogBackend>,
}

impl Catalog {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory(seed: Vec<Manga>) -> Self {
        Self::new(Arc::new(MemoryCatalog::new(seed)))
    }

    /// Opens the document store when enabled, otherwise or on failure runs
    /// on the in-memory list.
    pub async fn connect(catalog: &CatalogConfig, database: &DatabaseConfig) -> Self {
        if catalog.remote {
            match Self::open_remote(database, catalog.seed_sample).await {
                Ok(db) => {
                    info!("Catalog using document store");
                    return Self::new(Arc::new(db));
                }
                Err(e) => warn!("Document store unavailable, using in-memory catalog: {}", e),
            }
        }

        let seed = if catalog.seed_sample {
            seed::sample_catalog()
        } else {
            Vec::new()
        };
        info!("Catalog using in-memory list ({} titles)", seed.len());
        Self::in_memory(seed)
    }

    async fn open_remote(database: &DatabaseConfig, seed_sample: bool) -> Result<Database> {
        let db = Database::new(database).await?;
        db.init().await?;
        if seed_sample && db.count_manga().await? == 0 {
            info!("Seeding empty document store with sample titles");
            for manga in seed::sample_catalog() {
                db.insert_manga(&manga).await?;
            }
        }
        Ok(db)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn list_all(&self) -> Result<Vec<Manga>> {
        self.backend.list_all().await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Manga> {
        debug!("Fetching manga {} from {}", id, self.backend.name());
        self.backend.get_by_id(id).await
    }

    pub async fn get_by_author(&self, author: &str) -> Result<Vec<Manga>> {
        self.backend.get_by_author(author).await
    }

    pub async fn get_by_creator(&self, user_id: &str) -> Result<Vec<Manga>> {
        self.backend.get_by_creator(user_id).await
    }

    pub async fn create(&self, payload: NewManga) -> Result<Manga> {
        let manga = self.backend.create(payload).await?;
        info!("Created manga '{}' ({})", manga.title, manga.id);
        Ok(manga)
    }

    pub async fn update(&self, id: &str, changes: MangaUpdate) -> Result<Manga> {
        let manga = self.backend.update(id, changes).await?;
        info!("Updated manga '{}' ({})", manga.title, manga.id);
        Ok(manga)
    }

    pub async fn delete(&self, id: &str) -> Result<u64> {
        let deleted = self.backend.delete(id).await?;
        info!("Deleted {} record(s) for manga {}", deleted, id);
        Ok(deleted)
    }

    // Library views

    pub async fn browse(&self, query: &LibraryQuery) -> Result<Vec<Manga>> {
        Ok(library::browse(self.list_all().await?, query))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Manga>> {
        Ok(library::search(self.list_all().await?, query))
    }

    pub async fn genres(&self) -> Result<Vec<String>> {
        Ok(library::all_genres(&self.list_all().await?))
    }

    pub async fn top_rated(&self, limit: usize) -> Result<Vec<Manga>> {
        Ok(library::top_rated(self.list_all().await?, limit))
    }

    pub async fn trending(&self) -> Result<Vec<Manga>> {
        Ok(library::trending(self.list_all().await?))
    }

    pub async fn featured(&self) -> Result<Vec<Manga>> {
        Ok(library::featured(self.list_all().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_remote_uses_seeded_memory() {
        let catalog = Catalog::connect(
            &CatalogConfig {
                remote: false,
                seed_sample: true,
            },
            &DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
        )
        .await;

        assert_eq!(catalog.backend_name(), "memory");
        assert_eq!(catalog.list_all().await.unwrap().len(), seed::sample_catalog().len());
        assert_eq!(catalog.genres().await.unwrap()[0], "all");
    }

    #[tokio::test]
    async fn test_unreachable_remote_degrades_to_memory() {
        let dir = tempfile::TempDir::new().unwrap();
        // A directory cannot be opened as a database file.
        let url = format!("sqlite:{}", dir.path().display());

        let catalog = Catalog::connect(
            &CatalogConfig {
                remote: true,
                seed_sample: false,
            },
            &DatabaseConfig {
                url,
                max_connections: 1,
            },
        )
        .await;

        assert_eq!(catalog.backend_name(), "memory");
        assert!(catalog.list_all().await.unwrap().is_empty());
    }
}
