use crate::error::Result;
use crate::models::{ReaderRoute, ReadingHistoryEntry, SessionUser};
use crate::traits::KeyValueStore;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const CURRENT_USER_KEY: &str = "currentUser";
pub const AUTHENTICATED_KEY: &str = "isAuthenticated";
pub const FAVORITES_KEY: &str = "favorites";
pub const READING_HISTORY_KEY: &str = "readingHistory";
pub const RESUME_TARGET_KEY: &str = "resumeTarget";

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Local persistence adapter: session user, favorites and reading history.
///
/// Every mutating call is written through to the underlying store.
#[derive(Clone)]
pub struct LocalStore {
    store: Arc<dyn KeyValueStore>,
    history_limit: usize,
}

impl LocalStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::default()))
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!("Discarding unreadable '{}' entry: {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw).await
    }

    // Session

    pub async fn save_session(&self, user: &SessionUser) -> Result<()> {
        self.write_json(CURRENT_USER_KEY, user).await?;
        self.store.set(AUTHENTICATED_KEY, "true".to_string()).await
    }

    pub async fn current_user(&self) -> Result<Option<SessionUser>> {
        self.read_json(CURRENT_USER_KEY).await
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.store.get(AUTHENTICATED_KEY).await?.as_deref() == Some("true"))
    }

    pub async fn clear_session(&self) -> Result<()> {
        self.store.remove(CURRENT_USER_KEY).await?;
        self.store.remove(AUTHENTICATED_KEY).await
    }

    pub async fn set_resume_target(&self, route: &ReaderRoute) -> Result<()> {
        self.write_json(RESUME_TARGET_KEY, route).await
    }

    /// Returns and forgets the route a login should resume.
    pub async fn take_resume_target(&self) -> Result<Option<ReaderRoute>> {
        let route = self.read_json(RESUME_TARGET_KEY).await?;
        if route.is_some() {
            self.store.remove(RESUME_TARGET_KEY).await?;
        }
        Ok(route)
    }

    // Favorites

    pub async fn favorites(&self) -> Result<Vec<String>> {
        Ok(self.read_json(FAVORITES_KEY).await?.unwrap_or_default())
    }

    /// Returns false when the id was already a favorite.
    pub async fn add_favorite(&self, manga_id: &str) -> Result<bool> {
        let mut favorites = self.favorites().await?;
        if favorites.iter().any(|id| id == manga_id) {
            return Ok(false);
        }
        favorites.push(manga_id.to_string());
        self.write_json(FAVORITES_KEY, &favorites).await?;
        debug!("Added favorite {}", manga_id);
        Ok(true)
    }

    pub async fn remove_favorite(&self, manga_id: &str) -> Result<bool> {
        let mut favorites = self.favorites().await?;
        let before = favorites.len();
        favorites.retain(|id| id != manga_id);
        self.write_json(FAVORITES_KEY, &favorites).await?;
        Ok(favorites.len() != before)
    }

    pub async fn is_favorite(&self, manga_id: &str) -> Result<bool> {
        Ok(self.favorites().await?.iter().any(|id| id == manga_id))
    }

    /// Flips membership and returns the new state.
    pub async fn toggle_favorite(&self, manga_id: &str) -> Result<bool> {
        if self.is_favorite(manga_id).await? {
            self.remove_favorite(manga_id).await?;
            Ok(false)
        } else {
            self.add_favorite(manga_id).await?;
            Ok(true)
        }
    }

    // Reading history

    pub async fn reading_history(&self) -> Result<Vec<ReadingHistoryEntry>> {
        Ok(self.read_json(READING_HISTORY_KEY).await?.unwrap_or_default())
    }

    /// One entry per `(manga, chapter)`; a repeat read refreshes the
    /// timestamp and moves the entry to the front.
    pub async fn add_to_reading_history(&self, manga_id: &str, chapter_id: &str) -> Result<()> {
        let mut history = self.reading_history().await?;
        let entry = match history
            .iter()
            .position(|e| e.manga_id == manga_id && e.chapter_id == chapter_id)
        {
            Some(index) => {
                let mut entry = history.remove(index);
                entry.last_read = Utc::now();
                entry
            }
            None => ReadingHistoryEntry {
                manga_id: manga_id.to_string(),
                chapter_id: chapter_id.to_string(),
                last_read: Utc::now(),
            },
        };
        history.insert(0, entry);
        history.truncate(self.history_limit);
        self.write_json(READING_HISTORY_KEY, &history).await
    }

    pub async fn clear_reading_history(&self) -> Result<()> {
        self.store.remove(READING_HISTORY_KEY).await
    }
}

/// Key-value store persisted as a single JSON object file.
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) if !content.trim().is_empty() => serde_json::from_str(&content)?,
            Ok(_) => BTreeMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Local storage file {:?} not found, starting empty", path);
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    async fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        self.flush(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[tokio::test]
    async fn test_history_refreshes_existing_pair() {
        let store = LocalStore::in_memory();
        store.add_to_reading_history("5", "12").await.unwrap();
        let first = store.reading_history().await.unwrap()[0].last_read;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.add_to_reading_history("5", "12").await.unwrap();

        let history = store.reading_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].last_read > first);
    }

    #[tokio::test]
    async fn test_history_moves_reread_entry_to_front() {
        let store = LocalStore::in_memory();
        store.add_to_reading_history("1", "1").await.unwrap();
        store.add_to_reading_history("2", "1").await.unwrap();
        store.add_to_reading_history("1", "1").await.unwrap();

        let history = store.reading_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].manga_id, "1");
        assert_eq!(history[1].manga_id, "2");
    }

    #[tokio::test]
    async fn test_history_is_capped_with_oldest_evicted() {
        let store = LocalStore::in_memory();
        for i in 0..60 {
            store
                .add_to_reading_history("7", &i.to_string())
                .await
                .unwrap();
        }

        let history = store.reading_history().await.unwrap();
        assert_eq!(history.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(history[0].chapter_id, "59");
        assert_eq!(history[49].chapter_id, "10");
        assert!(!history.iter().any(|e| e.chapter_id == "9"));
    }

    #[tokio::test]
    async fn test_favorites_have_no_duplicates() {
        let store = LocalStore::in_memory();
        assert!(store.add_favorite("1").await.unwrap());
        assert!(!store.add_favorite("1").await.unwrap());
        assert!(store.add_favorite("2").await.unwrap());
        assert_eq!(store.favorites().await.unwrap(), vec!["1", "2"]);

        assert!(store.remove_favorite("1").await.unwrap());
        assert!(!store.is_favorite("1").await.unwrap());
        assert!(!store.toggle_favorite("2").await.unwrap());
        assert!(store.favorites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_round_trip_and_clear() {
        let store = LocalStore::in_memory();
        assert!(!store.is_authenticated().await.unwrap());

        let user = SessionUser {
            id: "u1".to_string(),
            email: "reader@example.com".to_string(),
            name: "reader".to_string(),
            avatar: String::new(),
            role: Role::User,
            joined_date: "2024-01-01".to_string(),
        };
        store.save_session(&user).await.unwrap();
        assert!(store.is_authenticated().await.unwrap());
        assert_eq!(store.current_user().await.unwrap(), Some(user));

        store.clear_session().await.unwrap();
        assert!(!store.is_authenticated().await.unwrap());
        assert!(store.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resume_target_is_taken_once() {
        let store = LocalStore::in_memory();
        let route = ReaderRoute::new("3", "9");
        store.set_resume_target(&route).await.unwrap();
        assert_eq!(store.take_resume_target().await.unwrap(), Some(route));
        assert_eq!(store.take_resume_target().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = LocalStore::new(Arc::new(FileKeyValueStore::open(&path).await.unwrap()));
        store.add_favorite("42").await.unwrap();
        store.add_to_reading_history("42", "1").await.unwrap();

        let reopened = LocalStore::new(Arc::new(FileKeyValueStore::open(&path).await.unwrap()));
        assert_eq!(reopened.favorites().await.unwrap(), vec!["42"]);
        assert_eq!(reopened.reading_history().await.unwrap().len(), 1);
    }
}
