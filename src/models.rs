use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: MangaStatus,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub favorites: u64,
    #[serde(rename = "type", default)]
    pub kind: MangaKind,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_trending: bool,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    /// Display label; not guaranteed to sort numerically.
    pub chapter_number: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum MangaStatus {
    #[default]
    Ongoing,
    Completed,
}

/// Declared presentation type; picks the reader's initial mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MangaKind {
    #[default]
    Manga,
    Webtoon,
}

/// Payload for creating a catalog record. The backend assigns id and timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManga {
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
    pub artist: Option<String>,
    pub description: String,
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub genres: Vec<String>,
    pub status: MangaStatus,
    pub rating: f32,
    pub kind: MangaKind,
    pub is_featured: bool,
    pub is_trending: bool,
    pub chapters: Vec<Chapter>,
    pub created_by: Option<String>,
}

/// Partial update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaUpdate {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub artist: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub banner_image: Option<String>,
    pub genres: Option<Vec<String>>,
    pub status: Option<MangaStatus>,
    pub rating: Option<f32>,
    pub views: Option<u64>,
    pub favorites: Option<u64>,
    pub kind: Option<MangaKind>,
    pub is_featured: Option<bool>,
    pub is_trending: Option<bool>,
    pub chapters: Option<Vec<Chapter>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewChapter {
    pub chapter_number: String,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub pages: Vec<String>,
}

/// A `(manga, chapter)` pair addressing one reader view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderRoute {
    pub manga_id: String,
    pub chapter_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistoryEntry {
    pub manga_id: String,
    pub chapter_id: String,
    pub last_read: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guest,
    User,
    Admin,
}

/// Opaque identity produced by a credential provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The user record kept in local persistence under `currentUser`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: String,
    pub role: Role,
    pub joined_date: String,
}

impl Manga {
    pub fn from_new(id: String, payload: NewManga, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: payload.title,
            subtitle: payload.subtitle,
            author: payload.author,
            artist: payload.artist,
            description: payload.description,
            cover_image: payload.cover_image,
            banner_image: payload.banner_image,
            genres: payload.genres,
            status: payload.status,
            rating: payload.rating.clamp(0.0, 5.0),
            views: 0,
            favorites: 0,
            kind: payload.kind,
            is_featured: payload.is_featured,
            is_trending: payload.is_trending,
            chapters: payload.chapters,
            created_by: payload.created_by,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn apply(&mut self, update: MangaUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(subtitle) = update.subtitle {
            self.subtitle = Some(subtitle);
        }
        if let Some(author) = update.author {
            self.author = author;
        }
        if let Some(artist) = update.artist {
            self.artist = Some(artist);
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(cover) = update.cover_image {
            self.cover_image = Some(cover);
        }
        if let Some(banner) = update.banner_image {
            self.banner_image = Some(banner);
        }
        if let Some(genres) = update.genres {
            self.genres = genres;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(rating) = update.rating {
            self.rating = rating.clamp(0.0, 5.0);
        }
        if let Some(views) = update.views {
            self.views = views;
        }
        if let Some(favorites) = update.favorites {
            self.favorites = favorites;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(featured) = update.is_featured {
            self.is_featured = featured;
        }
        if let Some(trending) = update.is_trending {
            self.is_trending = trending;
        }
        if let Some(chapters) = update.chapters {
            self.chapters = chapters;
        }
        self.updated_at = Some(now);
    }

    pub fn chapter(&self, chapter_id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == chapter_id)
    }

    pub fn chapter_index(&self, chapter_id: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.id == chapter_id)
    }
}

impl Chapter {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl ReaderRoute {
    pub fn new(manga_id: impl Into<String>, chapter_id: impl Into<String>) -> Self {
        Self {
            manga_id: manga_id.into(),
            chapter_id: chapter_id.into(),
        }
    }
}

impl Role {
    pub fn is_authenticated(self) -> bool {
        !matches!(self, Role::Guest)
    }
}

impl std::fmt::Display for MangaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MangaStatus::Ongoing => write!(f, "Ongoing"),
            MangaStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl std::fmt::Display for MangaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MangaKind::Manga => write!(f, "manga"),
            MangaKind::Webtoon => write!(f, "webtoon"),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Guest => write!(f, "guest"),
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::fmt::Display for ReaderRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/reader/{}/{}", self.manga_id, self.chapter_id)
    }
}

impl std::str::FromStr for MangaStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ongoing" => Ok(MangaStatus::Ongoing),
            "completed" => Ok(MangaStatus::Completed),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

impl std::str::FromStr for MangaKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manga" => Ok(MangaKind::Manga),
            "webtoon" => Ok(MangaKind::Webtoon),
            other => Err(format!("unknown type '{}'", other)),
        }
    }
}
