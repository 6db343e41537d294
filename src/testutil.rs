//! Shared test helpers, available to all `#[cfg(test)]` modules in the crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use crate::auth::UserSession;
use crate::error::{MangaReadError, Result};
use crate::models::{Chapter, Identity, Manga, NewManga, ReaderRoute, Role, SessionUser};
use crate::storage::MemoryKeyValueStore;
use crate::traits::{CredentialProvider, KeyValueStore, ProfileUpdate, ReaderHost, SessionEvent};

/// A manga whose chapter `i` has id `c{i}` and `page_counts[i]` pages.
pub fn make_manga(id: &str, title: &str, page_counts: &[usize]) -> Manga {
    let chapters = page_counts
        .iter()
        .enumerate()
        .map(|(i, &pages)| Chapter {
            id: format!("c{}", i),
            chapter_number: (i + 1).to_string(),
            title: format!("Chapter {}", i + 1),
            release_date: None,
            pages: (0..pages).map(|p| format!("page://{}/{}/{}", id, i, p)).collect(),
        })
        .collect();

    Manga {
        id: id.to_string(),
        title: title.to_string(),
        subtitle: None,
        author: "Test Author".to_string(),
        artist: None,
        description: String::new(),
        cover_image: None,
        banner_image: None,
        genres: Vec::new(),
        status: Default::default(),
        rating: 0.0,
        views: 0,
        favorites: 0,
        kind: Default::default(),
        is_featured: false,
        is_trending: false,
        chapters,
        created_by: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn new_manga(title: &str, author: &str) -> NewManga {
    NewManga {
        title: title.to_string(),
        author: author.to_string(),
        ..Default::default()
    }
}

pub fn identity(id: &str, email: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: email.to_string(),
        display_name: None,
        avatar_url: None,
        created_at: Utc::now(),
    }
}

pub fn make_session(role: Role) -> UserSession {
    UserSession {
        user: SessionUser {
            id: format!("{}-1", role),
            email: format!("{}@example.com", role),
            name: role.to_string(),
            avatar: String::new(),
            role,
            joined_date: "2024-01-01".to_string(),
        },
    }
}

/// In-memory credential provider counting every call it receives.
pub struct MockCredentials {
    accounts: RwLock<HashMap<String, (String, Identity)>>,
    calls: AtomicUsize,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for MockCredentials {
    fn default() -> Self {
        let (events, _) = broadcast::channel(8);
        Self {
            accounts: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            events,
        }
    }
}

impl MockCredentials {
    pub async fn add_account(&self, email: &str, password: &str) {
        let id = format!("uid-{}", email);
        self.accounts
            .write()
            .await
            .insert(email.to_string(), (password.to_string(), identity(&id, email)));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Publishes a session transition as if it came from the provider.
    pub fn emit(&self, event: SessionEvent) -> std::result::Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.events.send(event)
    }
}

#[async_trait::async_trait]
impl CredentialProvider for MockCredentials {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(MangaReadError::EmailInUse);
        }
        let created = identity(&format!("uid-{}", email), email);
        accounts.insert(email.to_string(), (password.to_string(), created.clone()));
        Ok(created)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.accounts.read().await.get(email) {
            Some((secret, identity)) if secret == password => Ok(identity.clone()),
            _ => Err(MangaReadError::InvalidCredentials),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, profile: ProfileUpdate) -> Result<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.write().await;
        let (_, identity) = accounts
            .values_mut()
            .find(|(_, identity)| identity.id == user_id)
            .ok_or(MangaReadError::InvalidCredentials)?;
        if profile.display_name.is_some() {
            identity.display_name = profile.display_name;
        }
        if profile.avatar_url.is_some() {
            identity.avatar_url = profile.avatar_url;
        }
        Ok(identity.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

/// Reader host recording navigations and fullscreen requests.
#[derive(Default)]
pub struct MockHost {
    fullscreen: AtomicBool,
    routes: Mutex<Vec<ReaderRoute>>,
}

impl MockHost {
    /// Simulates the user leaving fullscreen outside the reader.
    pub fn dismiss_fullscreen(&self) {
        self.fullscreen.store(false, Ordering::SeqCst);
    }

    pub fn routes(&self) -> Vec<ReaderRoute> {
        self.routes.lock().unwrap().clone()
    }
}

impl ReaderHost for MockHost {
    fn request_fullscreen(&self) -> Result<()> {
        self.fullscreen.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<()> {
        self.fullscreen.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }

    fn navigate(&self, route: &ReaderRoute) {
        self.routes.lock().unwrap().push(route.clone());
    }
}

/// In-memory key-value store whose next writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryKeyValueStore,
    failures: AtomicUsize,
}

impl FlakyStore {
    pub fn fail_next_writes(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if self.take_failure() {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.take_failure() {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
        }
        self.inner.remove(key).await
    }
}
