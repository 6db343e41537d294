use crate::auth::{AuthService, UserSession};
use crate::catalog::Catalog;
use crate::error::Result;
use crate::models::{Manga, ReaderRoute};
use crate::reader::keys::ReaderKey;
use crate::reader::session::{ReaderSession, Step};
use crate::traits::ReaderHost;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Liveness token for one pending reader open.
#[derive(Debug)]
pub struct Ticket {
    epoch: u64,
    route: ReaderRoute,
    user: UserSession,
}

impl Ticket {
    pub fn route(&self) -> &ReaderRoute {
        &self.route
    }
}

/// Drives a reader view: opens sessions behind the auth guard and applies
/// navigation side effects.
pub struct ReaderController {
    catalog: Catalog,
    auth: Arc<AuthService>,
    host: Arc<dyn ReaderHost>,
    epoch: u64,
    session: Option<ReaderSession>,
}

impl ReaderController {
    pub fn new(catalog: Catalog, auth: Arc<AuthService>, host: Arc<dyn ReaderHost>) -> Self {
        Self {
            catalog,
            auth,
            host,
            epoch: 0,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&ReaderSession> {
        self.session.as_ref()
    }

    /// Direct access for view-only changes (zoom, mode, controls).
    pub fn session_mut(&mut self) -> Option<&mut ReaderSession> {
        self.session.as_mut()
    }

    /// Checks the auth guard and invalidates whatever was open or pending.
    pub async fn request(&mut self, route: ReaderRoute) -> Result<Ticket> {
        let user = self.auth.require_session(&route).await?;
        self.invalidate();
        Ok(Ticket {
            epoch: self.epoch,
            route,
            user,
        })
    }

    /// Applies a fetch result for `ticket`. Returns `false` when the ticket
    /// went stale in the meantime and the result was dropped.
    pub async fn complete(&mut self, ticket: Ticket, fetched: Result<Manga>) -> Result<bool> {
        if ticket.epoch != self.epoch {
            debug!("Discarding stale reader result for {}", ticket.route);
            return Ok(false);
        }

        let session = ReaderSession::open(Some(&ticket.user), fetched?, &ticket.route.chapter_id)?;
        self.auth
            .store()
            .add_to_reading_history(&ticket.route.manga_id, &ticket.route.chapter_id)
            .await?;
        info!("Reading {} at {}", session.manga().title, ticket.route);
        self.session = Some(session);
        Ok(true)
    }

    pub async fn open(&mut self, route: ReaderRoute) -> Result<bool> {
        let ticket = self.request(route).await?;
        let fetched = self.catalog.get_by_id(&ticket.route.manga_id).await;
        self.complete(ticket, fetched).await
    }

    pub fn close(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.is_fullscreen() {
                if let Err(e) = session.exit_fullscreen(self.host.as_ref()) {
                    warn!("Could not leave fullscreen: {}", e);
                }
            }
        }
        self.invalidate();
    }

    pub fn on_auth_change(&mut self, session: Option<&UserSession>) {
        if session.is_none() {
            debug!("Session ended, closing reader");
            self.close();
        }
    }

    fn invalidate(&mut self) {
        self.epoch += 1;
        self.session = None;
    }

    /// Adopts fullscreen changes the host made on its own.
    pub fn sync_fullscreen(&mut self) {
        let active = self.host.is_fullscreen();
        if let Some(session) = self.session.as_mut() {
            session.sync_fullscreen(active);
        }
    }

    // Navigation

    pub async fn next_page(&mut self) -> Result<Step> {
        let step = self.session.as_mut().map_or(Step::Stay, ReaderSession::next_page);
        self.apply(step).await
    }

    pub async fn prev_page(&mut self) -> Result<Step> {
        let step = self.session.as_mut().map_or(Step::Stay, ReaderSession::prev_page);
        self.apply(step).await
    }

    pub async fn next_chapter(&mut self) -> Result<Step> {
        let step = self.session.as_mut().map_or(Step::Stay, ReaderSession::next_chapter);
        self.apply(step).await
    }

    pub async fn prev_chapter(&mut self) -> Result<Step> {
        let step = self.session.as_mut().map_or(Step::Stay, ReaderSession::prev_chapter);
        self.apply(step).await
    }

    pub async fn handle_key(&mut self, key: ReaderKey) -> Result<Step> {
        let step = match self.session.as_mut() {
            Some(session) => session.handle_key(key, self.host.as_ref())?,
            None => Step::Stay,
        };
        self.apply(step).await
    }

    /// The host follows the session first; a failed history write only costs the entry.
    async fn apply(&mut self, step: Step) -> Result<Step> {
        if let Step::Chapter(route) = &step {
            self.host.navigate(route);
            if let Err(e) = self
                .auth
                .store()
                .add_to_reading_history(&route.manga_id, &route.chapter_id)
                .await
            {
                warn!("Could not record {} in reading history: {}", route, e);
            }
        }
        Ok(step)
    }
}
