use crate::error::Result;
use crate::models::{Identity, Manga, MangaUpdate, NewManga, ReaderRoute};
use tokio::sync::broadcast;

/// Document store holding the manga catalog.
#[async_trait::async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// All records, newest first.
    async fn list_all(&self) -> Result<Vec<Manga>>;

    /// Missing ids fail with `MangaNotFound`.
    async fn get_by_id(&self, id: &str) -> Result<Manga>;

    /// Case-insensitive exact match on the author field.
    async fn get_by_author(&self, author: &str) -> Result<Vec<Manga>>;

    async fn get_by_creator(&self, user_id: &str) -> Result<Vec<Manga>>;

    async fn create(&self, payload: NewManga) -> Result<Manga>;

    async fn update(&self, id: &str, changes: MangaUpdate) -> Result<Manga>;

    /// Returns how many records were removed.
    async fn delete(&self, id: &str) -> Result<u64>;
}

/// Session transitions published by a credential provider.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(Identity),
    TokenRefreshed(Identity),
    SignedOut,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Email/password identity provider.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_out(&self) -> Result<()>;

    async fn update_profile(&self, user_id: &str, profile: ProfileUpdate) -> Result<Identity>;

    /// Receives every login, logout and token refresh from now on.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// String-keyed blob storage behind the local persistence adapter.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// Presentation environment hosting a reader view.
pub trait ReaderHost: Send + Sync {
    fn request_fullscreen(&self) -> Result<()>;

    fn exit_fullscreen(&self) -> Result<()>;

    /// Whether the host is currently presenting fullscreen.
    fn is_fullscreen(&self) -> bool;

    /// Route change to a different chapter view.
    fn navigate(&self, route: &ReaderRoute);
}
