use crate::auth::UserSession;
use crate::catalog::Catalog;
use crate::dashboard::AdminOverview;
use crate::error::{MangaReadError, Result};
use crate::models::{Chapter, Manga, MangaUpdate, NewChapter, NewManga};
use chrono::Utc;
use tracing::info;

/// Catalog management for administrators.
pub struct AdminPanel<'a> {
    catalog: &'a Catalog,
    session: &'a UserSession,
}

impl<'a> AdminPanel<'a> {
    /// Fails with `Forbidden` unless `session` is an admin session.
    pub fn new(catalog: &'a Catalog, session: &'a UserSession) -> Result<Self> {
        if !session.is_admin() {
            return Err(MangaReadError::forbidden(format!(
                "{} is not an administrator",
                session.user.email
            )));
        }
        Ok(Self { catalog, session })
    }

    pub async fn add_manga(&self, mut payload: NewManga) -> Result<Manga> {
        if payload.title.trim().is_empty() {
            return Err(MangaReadError::validation("Title is required"));
        }
        payload.created_by = Some(self.session.user_id().to_string());
        self.catalog.create(payload).await
    }

    pub async fn edit_manga(&self, id: &str, changes: MangaUpdate) -> Result<Manga> {
        self.catalog.update(id, changes).await
    }

    pub async fn remove_manga(&self, id: &str) -> Result<()> {
        match self.catalog.delete(id).await? {
            0 => Err(MangaReadError::manga_not_found(id)),
            _ => Ok(()),
        }
    }

    /// Appends a chapter after the existing ones.
    pub async fn add_chapter(&self, manga_id: &str, chapter: NewChapter) -> Result<Chapter> {
        if chapter.chapter_number.trim().is_empty() {
            return Err(MangaReadError::validation("Chapter number is required"));
        }

        let manga = self.catalog.get_by_id(manga_id).await?;
        let mut chapters = manga.chapters;
        let created = Chapter {
            id: next_chapter_id(&chapters),
            chapter_number: chapter.chapter_number,
            title: chapter.title,
            release_date: chapter.release_date.or_else(|| Some(Utc::now().date_naive())),
            pages: chapter.pages,
        };
        chapters.push(created.clone());

        self.catalog
            .update(
                manga_id,
                MangaUpdate {
                    chapters: Some(chapters),
                    ..Default::default()
                },
            )
            .await?;
        info!("Added chapter {} to manga {}", created.chapter_number, manga_id);
        Ok(created)
    }

    pub async fn overview(&self) -> Result<AdminOverview> {
        AdminOverview::load(self.catalog).await
    }
}

fn next_chapter_id(existing: &[Chapter]) -> String {
    let mut millis = Utc::now().timestamp_millis();
    while existing.iter().any(|c| c.id == millis.to_string()) {
        millis += 1;
    }
    millis.to_string()
}
