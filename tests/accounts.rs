use mangaread::auth::{AdminPolicy, AuthService, RegisterRequest};
use mangaread::config::DatabaseConfig;
use mangaread::credentials::SqliteCredentialProvider;
use mangaread::database::Database;
use mangaread::models::Role;
use mangaread::storage::{FileKeyValueStore, LocalStore};
use mangaread::traits::{CredentialProvider, SessionEvent};
use mangaread::MangaReadError;
use std::sync::Arc;
use tempfile::TempDir;

async fn provider(dir: &TempDir) -> Arc<SqliteCredentialProvider> {
    let db = Database::new(&DatabaseConfig {
        url: format!("sqlite:{}", dir.path().join("accounts.db").display()),
        max_connections: 1,
    })
    .await
    .unwrap();
    db.init().await.unwrap();
    Arc::new(SqliteCredentialProvider::new(db.pool))
}

async fn service(dir: &TempDir, provider: Arc<SqliteCredentialProvider>) -> AuthService {
    let store = FileKeyValueStore::open(dir.path().join("local_storage.json"))
        .await
        .unwrap();
    AuthService::new(
        Some(provider as Arc<dyn CredentialProvider>),
        AdminPolicy::new(vec!["editor@example.com".to_string()]),
        LocalStore::new(Arc::new(store)),
    )
}

fn request(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
        confirm_password: password.to_string(),
        display_name: None,
    }
}

#[tokio::test]
async fn test_register_login_logout() {
    let dir = TempDir::new().unwrap();
    let auth = service(&dir, provider(&dir).await).await;

    let session = auth.register(request("reader@example.com", "secret1")).await.unwrap();
    assert_eq!(session.user.name, "reader");
    assert_eq!(session.role(), Role::User);
    assert!(session.user.avatar.contains("reader"));
    assert!(auth.is_authenticated().await.unwrap());

    auth.logout().await.unwrap();
    assert!(!auth.is_authenticated().await.unwrap());
    assert_eq!(auth.role().await.unwrap(), Role::Guest);

    let session = auth.login("reader@example.com", "secret1").await.unwrap();
    assert_eq!(session.user.name, "reader");
}

#[tokio::test]
async fn test_provider_errors_map_to_messages() {
    let dir = TempDir::new().unwrap();
    let auth = service(&dir, provider(&dir).await).await;

    auth.register(request("reader@example.com", "secret1")).await.unwrap();

    let err = auth.register(request("reader@example.com", "secret2")).await.unwrap_err();
    assert_eq!(err.to_string(), "Email is already registered");

    let err = auth.login("reader@example.com", "wrong-pass").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid email or password");

    let err = auth.register(request("not-an-email", "secret1")).await.unwrap_err();
    assert!(matches!(err, MangaReadError::InvalidEmail));
}

#[tokio::test]
async fn test_allowlisted_account_is_admin() {
    let dir = TempDir::new().unwrap();
    let auth = service(&dir, provider(&dir).await).await;

    let session = auth.register(request("Editor@example.com", "secret1")).await.unwrap();
    assert!(session.is_admin());
    assert!(auth.is_admin().await.unwrap());
}

#[tokio::test]
async fn test_provider_publishes_session_events() {
    let dir = TempDir::new().unwrap();
    let provider = provider(&dir).await;
    let mut events = provider.subscribe();

    provider.sign_up("reader@example.com", "secret1").await.unwrap();
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedIn(_)));

    provider.sign_out().await.unwrap();
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedOut));
}

#[tokio::test]
async fn test_session_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let provider = provider(&dir).await;

    let auth = service(&dir, provider.clone()).await;
    auth.register(request("reader@example.com", "secret1")).await.unwrap();
    drop(auth);

    let auth = service(&dir, provider).await;
    let session = auth.current_session().await.unwrap().unwrap();
    assert_eq!(session.user.email, "reader@example.com");
}

#[tokio::test]
async fn test_email_lookup_folds_non_ascii() {
    let dir = TempDir::new().unwrap();
    let auth = service(&dir, provider(&dir).await).await;

    auth.register(request("Zoë@example.com", "secret1")).await.unwrap();
    auth.logout().await.unwrap();

    let session = auth.login("ZOË@EXAMPLE.COM", "secret1").await.unwrap();
    assert_eq!(session.user.email, "Zoë@example.com");

    let err = auth.register(request("zoë@example.com", "secret2")).await.unwrap_err();
    assert!(matches!(err, MangaReadError::EmailInUse));
}
