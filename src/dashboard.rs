use crate::catalog::Catalog;
use crate::error::Result;
use crate::library;
use crate::models::{Chapter, Manga, ReadingHistoryEntry};
use crate::storage::LocalStore;
use futures::future::join_all;
use tracing::debug;

pub const CONTINUE_READING_LIMIT: usize = 4;
pub const TOP_RATED_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderStats {
    pub manga_read: usize,
    pub favorites: usize,
}

#[derive(Debug, Clone)]
pub struct ContinueReading {
    pub manga: Manga,
    pub chapter: Chapter,
    pub entry: ReadingHistoryEntry,
}

/// Per-user landing view built from local history and favorites.
#[derive(Debug, Clone)]
pub struct UserDashboard {
    pub stats: ReaderStats,
    pub continue_reading: Vec<ContinueReading>,
    pub favorites: Vec<Manga>,
}

impl UserDashboard {
    /// Entries whose manga or chapter no longer resolve are skipped.
    pub async fn load(catalog: &Catalog, store: &LocalStore) -> Result<Self> {
        let history = store.reading_history().await?;
        let favorite_ids = store.favorites().await?;

        let recent: Vec<_> = history.iter().take(CONTINUE_READING_LIMIT).cloned().collect();
        let (recent_manga, favorite_manga) = futures::join!(
            join_all(recent.iter().map(|entry| catalog.get_by_id(&entry.manga_id))),
            join_all(favorite_ids.iter().map(|id| catalog.get_by_id(id))),
        );

        let continue_reading = recent
            .into_iter()
            .zip(recent_manga)
            .filter_map(|(entry, manga)| {
                let manga = resolved(manga, &entry.manga_id)?;
                let chapter = manga.chapter(&entry.chapter_id)?.clone();
                Some(ContinueReading {
                    manga,
                    chapter,
                    entry,
                })
            })
            .collect();

        let favorites = favorite_ids
            .iter()
            .zip(favorite_manga)
            .filter_map(|(id, manga)| resolved(manga, id))
            .collect();

        Ok(Self {
            stats: ReaderStats {
                manga_read: history.len(),
                favorites: favorite_ids.len(),
            },
            continue_reading,
            favorites,
        })
    }
}

fn resolved(manga: Result<Manga>, id: &str) -> Option<Manga> {
    match manga {
        Ok(manga) => Some(manga),
        Err(e) => {
            debug!("Skipping unresolved manga {}: {}", id, e);
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminOverview {
    pub total_manga: usize,
    pub total_chapters: usize,
    pub top_rated: Vec<Manga>,
}

impl AdminOverview {
    pub async fn load(catalog: &Catalog) -> Result<Self> {
        let list = catalog.list_all().await?;
        Ok(Self {
            total_manga: list.len(),
            total_chapters: list.iter().map(|m| m.chapters.len()).sum(),
            top_rated: library::top_rated(list, TOP_RATED_LIMIT),
        })
    }
}
