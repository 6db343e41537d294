use mangaread::auth::{AdminPolicy, AuthService};
use mangaread::catalog::Catalog;
use mangaread::config::{CatalogConfig, DatabaseConfig};
use mangaread::dashboard::UserDashboard;
use mangaread::models::{ReaderRoute, Role, SessionUser};
use mangaread::reader::{ReaderController, ReaderKey, ReadingMode, Step};
use mangaread::storage::LocalStore;
use mangaread::traits::ReaderHost;
use mangaread::MangaReadError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingHost {
    fullscreen: AtomicBool,
    routes: Mutex<Vec<ReaderRoute>>,
}

impl ReaderHost for RecordingHost {
    fn request_fullscreen(&self) -> mangaread::Result<()> {
        self.fullscreen.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit_fullscreen(&self) -> mangaread::Result<()> {
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

async fn sample_catalog() -> Catalog {
    Catalog::connect(
        &CatalogConfig {
            remote: false,
            seed_sample: true,
        },
        &DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
    )
    .await
}

fn reader() -> SessionUser {
    SessionUser {
        id: "u-1".to_string(),
        email: "reader@example.com".to_string(),
        name: "reader".to_string(),
        avatar: String::new(),
        role: Role::User,
        joined_date: "2024-05-01".to_string(),
    }
}

#[tokio::test]
async fn test_guest_is_sent_to_login_then_resumes() {
    let store = LocalStore::in_memory();
    let auth = Arc::new(AuthService::new(None, AdminPolicy::default(), store.clone()));
    let host = Arc::new(RecordingHost::default());
    let mut controller = ReaderController::new(sample_catalog().await, auth.clone(), host);

    let route = ReaderRoute::new("2", "1");
    let err = controller.open(route.clone()).await.unwrap_err();
    assert!(matches!(err, MangaReadError::AuthenticationRequired(_)));

    store.save_session(&reader()).await.unwrap();
    let resume = auth.take_resume_target().await.unwrap().unwrap();
    assert_eq!(resume, route);
    assert!(controller.open(resume).await.unwrap());
}

#[tokio::test]
async fn test_reading_across_chapters_feeds_dashboard() {
    let store = LocalStore::in_memory();
    store.save_session(&reader()).await.unwrap();
    let auth = Arc::new(AuthService::new(None, AdminPolicy::default(), store.clone()));
    let host = Arc::new(RecordingHost::default());
    let catalog = sample_catalog().await;
    let mut controller = ReaderController::new(catalog.clone(), auth, host.clone());

    controller.open(ReaderRoute::new("1", "1")).await.unwrap();
    assert_eq!(controller.session().unwrap().mode(), ReadingMode::Manga);

    let mut crossed = None;
    for _ in 0..10 {
        if let Step::Chapter(route) = controller.handle_key(ReaderKey::Next).await.unwrap() {
            crossed = Some(route);
            break;
        }
    }
    assert_eq!(crossed, Some(ReaderRoute::new("1", "2")));
    assert_eq!(host.routes.lock().unwrap().len(), 1);

    store.add_favorite("2").await.unwrap();
    let dashboard = UserDashboard::load(&catalog, &store).await.unwrap();
    assert_eq!(dashboard.stats.manga_read, 2);
    assert_eq!(dashboard.continue_reading[0].chapter.id, "2");
    assert_eq!(dashboard.favorites[0].id, "2");
}
