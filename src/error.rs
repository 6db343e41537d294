use crate::models::ReaderRoute;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MangaReadError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration encoding error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Manga not found: {0}")]
    MangaNotFound(String),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("Chapter has no pages: {0}")]
    EmptyChapter(String),

    #[error("Authentication required to open {0}")]
    AuthenticationRequired(ReaderRoute),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Email is already registered")]
    EmailInUse,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid admin credentials")]
    InvalidAdminCredentials,

    #[error("Credential provider is not configured")]
    CredentialsUnavailable,

    #[error("Credential provider error: {0}")]
    Credential(String),

    #[error("Presentation host error: {0}")]
    Host(String),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] argon2::Error),
}

impl MangaReadError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn manga_not_found(manga_id: impl Into<String>) -> Self {
        Self::MangaNotFound(manga_id.into())
    }

    pub fn chapter_not_found(chapter_id: impl Into<String>) -> Self {
        Self::ChapterNotFound(chapter_id.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Not-found conditions render as an empty view rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MangaNotFound(_) | Self::ChapterNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, MangaReadError>;
