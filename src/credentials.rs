use crate::error::{MangaReadError, Result};
use crate::models::Identity;
use crate::traits::{CredentialProvider, ProfileUpdate, SessionEvent};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 16;
const MIN_PROVIDER_PASSWORD: usize = 6;

/// Email/password accounts stored in the `users` table of the catalog database.
pub struct SqliteCredentialProvider {
    pool: SqlitePool,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for Identity {
    fn from(row: UserRow) -> Self {
        Identity {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

impl SqliteCredentialProvider {
    /// Expects the schema created by `Database::init`.
    pub fn new(pool: SqlitePool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { pool, events }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email_lower = ?")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait::async_trait]
impl CredentialProvider for SqliteCredentialProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        if !is_plausible_email(email) {
            return Err(MangaReadError::InvalidEmail);
        }
        if password.len() < MIN_PROVIDER_PASSWORD {
            return Err(MangaReadError::WeakPassword);
        }
        if self.find_by_email(email).await?.is_some() {
            return Err(MangaReadError::EmailInUse);
        }

        let salt = Uuid::new_v4();
        let config = argon2::Config::default();
        let hash = argon2::hash_encoded(password.as_bytes(), salt.as_bytes(), &config)?;

        let row = UserRow {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: hash,
            display_name: None,
            avatar_url: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, email_lower, password_hash, display_name, avatar_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.email)
        .bind(row.email.to_lowercase())
        .bind(&row.password_hash)
        .bind(&row.display_name)
        .bind(&row.avatar_url)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        info!("Registered account {}", row.email);
        let identity = Identity::from(row);
        self.publish(SessionEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let row = self
            .find_by_email(email)
            .await?
            .ok_or(MangaReadError::InvalidCredentials)?;

        if !argon2::verify_encoded(&row.password_hash, password.as_bytes())? {
            return Err(MangaReadError::InvalidCredentials);
        }

        debug!("Signed in {}", row.email);
        let identity = Identity::from(row);
        self.publish(SessionEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.publish(SessionEvent::SignedOut);
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, profile: ProfileUpdate) -> Result<Identity> {
        sqlx::query(
            r#"
            UPDATE users
            SET display_name = COALESCE(?, display_name), avatar_url = COALESCE(?, avatar_url)
            WHERE id = ?
            "#,
        )
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| MangaReadError::Credential(format!("unknown account {}", user_id)))?;

        let identity = Identity::from(row);
        self.publish(SessionEvent::TokenRefreshed(identity.clone()));
        Ok(identity)
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
