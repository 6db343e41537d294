use crate::config::AuthConfig;
use crate::error::{MangaReadError, Result};
use crate::models::{Identity, ReaderRoute, Role, SessionUser};
use crate::storage::LocalStore;
use crate::traits::{CredentialProvider, ProfileUpdate, SessionEvent};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

const LOCAL_ADMIN_ID: &str = "admin-001";
const LOCAL_ADMIN_JOINED: &str = "2024-01-01";

/// Who counts as an administrator.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    allowlist: Vec<String>,
    local_login: Option<(String, String)>,
}

impl AdminPolicy {
    pub fn new(allowlist: Vec<String>) -> Self {
        Self {
            allowlist: allowlist.into_iter().map(|e| e.to_lowercase()).collect(),
            local_login: None,
        }
    }

    pub fn with_local_login(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.local_login = Some((email.into(), password.into()));
        self
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let policy = Self::new(config.admin_emails.clone());
        match &config.local_admin {
            Some(admin) => policy.with_local_login(&admin.email, &admin.password),
            None => policy,
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.allowlist.iter().any(|e| *e == email)
            || self
                .local_login
                .as_ref()
                .is_some_and(|(admin, _)| admin.to_lowercase() == email)
    }

    pub fn role_for(&self, email: &str) -> Role {
        if self.is_admin_email(email) {
            Role::Admin
        } else {
            Role::User
        }
    }

    fn accepts_local_login(&self, email: &str, password: &str) -> bool {
        self.local_login
            .as_ref()
            .is_some_and(|(admin, secret)| admin == email && secret == password)
    }
}

/// An authenticated user, created on login and dropped on logout.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSession {
    pub user: SessionUser,
}

impl UserSession {
    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub display_name: Option<String>,
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

pub fn avatar_url(name: &str, background: &str, color: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background={}&color={}",
        name, background, color
    )
}

/// Checks run before any credential provider call.
pub fn validate_registration(request: &RegisterRequest) -> Result<()> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(MangaReadError::validation("Email and password are required"));
    }
    if request.password != request.confirm_password {
        return Err(MangaReadError::validation("Passwords do not match"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(MangaReadError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Session/auth facade over the credential provider and local persistence.
pub struct AuthService {
    credentials: Option<Arc<dyn CredentialProvider>>,
    policy: AdminPolicy,
    store: LocalStore,
}

impl AuthService {
    pub fn new(
        credentials: Option<Arc<dyn CredentialProvider>>,
        policy: AdminPolicy,
        store: LocalStore,
    ) -> Self {
        Self {
            credentials,
            policy,
            store,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    fn provider(&self) -> Result<&Arc<dyn CredentialProvider>> {
        self.credentials
            .as_ref()
            .ok_or(MangaReadError::CredentialsUnavailable)
    }

    fn session_user(&self, identity: &Identity) -> SessionUser {
        let name = identity
            .display_name
            .clone()
            .unwrap_or_else(|| email_local_part(&identity.email).to_string());
        let avatar = identity
            .avatar_url
            .clone()
            .unwrap_or_else(|| avatar_url(&name, "dc3545", "fff"));

        SessionUser {
            id: identity.id.clone(),
            email: identity.email.clone(),
            name,
            avatar,
            role: self.policy.role_for(&identity.email),
            joined_date: identity.created_at.to_rfc3339(),
        }
    }

    async fn start_session(&self, user: SessionUser) -> Result<UserSession> {
        self.store.save_session(&user).await?;
        info!("Session started for {} ({})", user.email, user.role);
        Ok(UserSession { user })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserSession> {
        validate_registration(&request)?;
        let provider = self.provider()?;

        let identity = provider.sign_up(&request.email, &request.password).await?;

        let name = request
            .display_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email_local_part(&request.email).to_string());
        let profile = ProfileUpdate {
            display_name: Some(name.clone()),
            avatar_url: Some(avatar_url(&name, "dc3545", "fff")),
        };
        let identity = match provider.update_profile(&identity.id, profile).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!("Profile update failed for {}: {}", identity.email, e);
                Identity {
                    display_name: Some(name),
                    ..identity
                }
            }
        };

        self.start_session(self.session_user(&identity)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserSession> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(MangaReadError::validation("Email and password are required"));
        }
        let identity = self.provider()?.sign_in(email, password).await?;
        self.start_session(self.session_user(&identity)).await
    }

    /// Local-only admin login; never reaches the credential provider.
    pub async fn login_admin(&self, email: &str, password: &str) -> Result<UserSession> {
        if !self.policy.accepts_local_login(email, password) {
            return Err(MangaReadError::InvalidAdminCredentials);
        }

        let user = SessionUser {
            id: LOCAL_ADMIN_ID.to_string(),
            email: email.to_string(),
            name: "Admin".to_string(),
            avatar: avatar_url("Admin", "ffc107", "000"),
            role: Role::Admin,
            joined_date: LOCAL_ADMIN_JOINED.to_string(),
        };
        self.start_session(user).await
    }

    /// Clears the local session and reading history even if the provider fails.
    pub async fn logout(&self) -> Result<()> {
        if let Some(provider) = &self.credentials {
            if let Err(e) = provider.sign_out().await {
                warn!("Sign-out failed: {}", e);
            }
        }
        self.store.clear_session().await?;
        self.store.clear_reading_history().await?;
        info!("Session ended");
        Ok(())
    }

    pub async fn current_session(&self) -> Result<Option<UserSession>> {
        if !self.store.is_authenticated().await? {
            return Ok(None);
        }
        Ok(self.store.current_user().await?.map(|user| UserSession { user }))
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.current_session().await?.is_some())
    }

    pub async fn role(&self) -> Result<Role> {
        Ok(match self.current_session().await? {
            Some(session) if self.policy.is_admin_email(&session.user.email) => Role::Admin,
            Some(session) => session.role(),
            None => Role::Guest,
        })
    }

    pub async fn is_admin(&self) -> Result<bool> {
        Ok(self.role().await? == Role::Admin)
    }

    /// Entry contract of the reader: without a session the route is kept
    /// for after login and the caller must redirect to authentication.
    pub async fn require_session(&self, route: &ReaderRoute) -> Result<UserSession> {
        match self.current_session().await? {
            Some(session) => Ok(session),
            None => {
                self.store.set_resume_target(route).await?;
                Err(MangaReadError::AuthenticationRequired(route.clone()))
            }
        }
    }

    pub async fn take_resume_target(&self) -> Result<Option<ReaderRoute>> {
        self.store.take_resume_target().await
    }

    /// Applies one provider session transition and returns the resulting session.
    pub async fn apply_event(&self, event: SessionEvent) -> Result<Option<UserSession>> {
        match event {
            SessionEvent::SignedIn(identity) | SessionEvent::TokenRefreshed(identity) => {
                let session = self.start_session(self.session_user(&identity)).await?;
                Ok(Some(session))
            }
            SessionEvent::SignedOut => {
                debug!("Provider signed out, falling back to local session");
                self.current_session().await
            }
        }
    }

    /// Follows provider events until the channel closes, handing every
    /// resolved session to `on_change`. A failed event is logged and skipped.
    pub async fn follow<F>(&self, mut events: broadcast::Receiver<SessionEvent>, mut on_change: F)
    where
        F: FnMut(Option<UserSession>),
    {
        loop {
            match events.recv().await {
                Ok(event) => match self.apply_event(event).await {
                    Ok(session) => on_change(session),
                    Err(e) => warn!("Could not apply session event: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Missed {} session events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<SessionEvent>> {
        self.credentials.as_ref().map(|p| p.subscribe())
    }
}
