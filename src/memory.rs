use crate::error::{MangaReadError, Result};
use crate::models::{Manga, MangaUpdate, NewManga};
use crate::traits::CatalogBackend;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process catalog used when the document store is not available.
#[derive(Default)]
pub struct MemoryCatalog {
    manga: RwLock<Vec<Manga>>,
}

impl MemoryCatalog {
    pub fn new(seed: Vec<Manga>) -> Self {
        Self {
            manga: RwLock::new(seed),
        }
    }

    /// Ids are the creation time in milliseconds, bumped past any collision.
    fn next_id(existing: &[Manga]) -> String {
        let mut millis = Utc::now().timestamp_millis();
        while existing.iter().any(|m| m.id == millis.to_string()) {
            millis += 1;
        }
        millis.to_string()
    }
}

#[async_trait::async_trait]
impl CatalogBackend for MemoryCatalog {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_all(&self) -> Result<Vec<Manga>> {
        Ok(self.manga.read().await.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Manga> {
        self.manga
            .read()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| MangaReadError::manga_not_found(id))
    }

    async fn get_by_author(&self, author: &str) -> Result<Vec<Manga>> {
        let wanted = author.to_lowercase();
        Ok(self
            .manga
            .read()
            .await
            .iter()
            .filter(|m| m.author.to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    async fn get_by_creator(&self, user_id: &str) -> Result<Vec<Manga>> {
        Ok(self
            .manga
            .read()
            .await
            .iter()
            .filter(|m| m.created_by.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn create(&self, payload: NewManga) -> Result<Manga> {
        let mut list = self.manga.write().await;
        let manga = Manga::from_new(Self::next_id(&list), payload, Utc::now());
        list.insert(0, manga.clone());
        debug!("Created in-memory manga {} ({})", manga.title, manga.id);
        Ok(manga)
    }

    async fn update(&self, id: &str, changes: MangaUpdate) -> Result<Manga> {
        let mut list = self.manga.write().await;
        let manga = list
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| MangaReadError::manga_not_found(id))?;
        manga.apply(changes, Utc::now());
        Ok(manga.clone())
    }

    async fn delete(&self, id: &str) -> Result<u64> {
        let mut list = self.manga.write().await;
        let before = list.len();
        list.retain(|m| m.id != id);
        Ok((before - list.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_manga, new_manga};

    #[tokio::test]
    async fn test_create_prepends_with_time_based_id() {
        let catalog = MemoryCatalog::new(vec![make_manga("1", "Existing", &[1])]);
        let first = catalog.create(new_manga("Fresh", "Someone")).await.unwrap();
        let second = catalog.create(new_manga("Fresher", "Someone")).await.unwrap();

        assert!(first.id.parse::<i64>().is_ok());
        assert_ne!(first.id, second.id);

        let list = catalog.list_all().await.unwrap();
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
        assert_eq!(list[2].id, "1");
    }

    #[tokio::test]
    async fn test_author_match_ignores_case() {
        let mut manga = make_manga("1", "Garden", &[1]);
        manga.author = "Makoto Shinkai".to_string();
        let catalog = MemoryCatalog::new(vec![manga]);

        assert_eq!(catalog.get_by_author("makoto shinkai").await.unwrap().len(), 1);
        assert!(catalog.get_by_author("makoto").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_ids() {
        let catalog = MemoryCatalog::new(vec![make_manga("1", "Garden", &[1])]);

        let err = catalog
            .update("404", MangaUpdate::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(catalog.delete("404").await.unwrap(), 0);

        let updated = catalog
            .update(
                "1",
                MangaUpdate {
                    rating: Some(4.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.rating, 4.5);
        assert_eq!(updated.title, "Garden");
        assert!(updated.updated_at.is_some());

        assert_eq!(catalog.delete("1").await.unwrap(), 1);
        assert!(catalog.get_by_id("1").await.unwrap_err().is_not_found());
    }
}
