use crate::auth::UserSession;
use crate::error::{MangaReadError, Result};
use crate::models::{Chapter, Manga, MangaKind, ReaderRoute};
use crate::reader::keys::ReaderKey;
use crate::traits::ReaderHost;
use tracing::debug;

pub const ZOOM_MIN: u16 = 50;
pub const ZOOM_MAX: u16 = 200;
pub const ZOOM_STEP: u16 = 25;
pub const ZOOM_DEFAULT: u16 = 100;

/// Page scale in percent, always within `ZOOM_MIN..=ZOOM_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zoom(u16);

impl Zoom {
    pub fn percent(self) -> u16 {
        self.0
    }

    pub fn scale(self) -> f32 {
        f32::from(self.0) / 100.0
    }

    pub fn zoom_in(self) -> Self {
        Zoom((self.0 + ZOOM_STEP).min(ZOOM_MAX))
    }

    pub fn zoom_out(self) -> Self {
        Zoom(self.0.saturating_sub(ZOOM_STEP).max(ZOOM_MIN))
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Zoom(ZOOM_DEFAULT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingMode {
    /// One page at a time.
    Manga,
    /// Every page of the chapter as one strip.
    Webtoon,
}

impl From<MangaKind> for ReadingMode {
    fn from(kind: MangaKind) -> Self {
        match kind {
            MangaKind::Manga => ReadingMode::Manga,
            MangaKind::Webtoon => ReadingMode::Webtoon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub chapter_index: usize,
    pub page_index: usize,
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Boundary reached or not applicable in the current mode.
    Stay,
    /// Moved within the current chapter.
    Page,
    /// Entered another chapter; the view must load this route.
    Chapter(ReaderRoute),
}

impl Step {
    pub fn moved(&self) -> bool {
        !matches!(self, Step::Stay)
    }
}

/// Position and view state of one open reader view.
#[derive(Debug, Clone)]
pub struct ReaderSession {
    manga: Manga,
    position: Position,
    mode: ReadingMode,
    zoom: Zoom,
    fullscreen: bool,
    controls_visible: bool,
}

impl ReaderSession {
    /// Opens `chapter_id` of `manga` at its first page.
    ///
    /// Refused without an authenticated user; the error carries the
    /// requested route so it can be resumed after login.
    pub fn open(user: Option<&UserSession>, manga: Manga, chapter_id: &str) -> Result<Self> {
        if user.is_none() {
            return Err(MangaReadError::AuthenticationRequired(ReaderRoute::new(
                manga.id.clone(),
                chapter_id,
            )));
        }

        let chapter_index = manga.chapter_index(chapter_id).ok_or_else(|| {
            MangaReadError::chapter_not_found(format!("{}/{}", manga.id, chapter_id))
        })?;
        if manga.chapters[chapter_index].pages.is_empty() {
            return Err(MangaReadError::EmptyChapter(format!("{}/{}", manga.id, chapter_id)));
        }

        debug!("Opening reader for {} chapter {}", manga.title, chapter_id);
        Ok(Self {
            mode: ReadingMode::from(manga.kind),
            manga,
            position: Position {
                chapter_index,
                page_index: 0,
            },
            zoom: Zoom::default(),
            fullscreen: false,
            controls_visible: true,
        })
    }

    pub fn manga(&self) -> &Manga {
        &self.manga
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn mode(&self) -> ReadingMode {
        self.mode
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn current_chapter(&self) -> &Chapter {
        &self.manga.chapters[self.position.chapter_index]
    }

    pub fn route(&self) -> ReaderRoute {
        ReaderRoute::new(self.manga.id.clone(), self.current_chapter().id.clone())
    }

    fn page_count(&self) -> usize {
        self.current_chapter().pages.len()
    }

    fn chapter_count(&self) -> usize {
        self.manga.chapters.len()
    }

    pub fn current_page_uri(&self) -> Option<&str> {
        self.current_chapter()
            .pages
            .get(self.position.page_index)
            .map(String::as_str)
    }

    /// Pages the view shows: the current one in manga mode, the whole chapter in webtoon mode.
    pub fn visible_pages(&self) -> &[String] {
        let pages = &self.current_chapter().pages;
        match self.mode {
            ReadingMode::Manga => {
                let i = self.position.page_index.min(pages.len().saturating_sub(1));
                &pages[i..pages.len().min(i + 1)]
            }
            ReadingMode::Webtoon => pages,
        }
    }

    /// Share of the chapter shown so far, in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        let count = self.page_count();
        if count == 0 || self.mode == ReadingMode::Webtoon {
            return 1.0;
        }
        (self.position.page_index + 1) as f32 / count as f32
    }

    /// Nearest chapter with pages after the current one.
    fn next_readable(&self) -> Option<usize> {
        (self.position.chapter_index + 1..self.chapter_count())
            .find(|&i| !self.manga.chapters[i].pages.is_empty())
    }

    fn prev_readable(&self) -> Option<usize> {
        (0..self.position.chapter_index)
            .rev()
            .find(|&i| !self.manga.chapters[i].pages.is_empty())
    }

    pub fn has_next_chapter(&self) -> bool {
        self.next_readable().is_some()
    }

    pub fn has_prev_chapter(&self) -> bool {
        self.prev_readable().is_some()
    }

    /// Whether the view can move forward: by page in manga mode, by chapter
    /// in webtoon mode where page requests are ignored.
    pub fn can_advance(&self) -> bool {
        match self.mode {
            ReadingMode::Manga => {
                self.position.page_index + 1 < self.page_count() || self.has_next_chapter()
            }
            ReadingMode::Webtoon => self.has_next_chapter(),
        }
    }

    /// Backward counterpart of `can_advance`.
    pub fn can_retreat(&self) -> bool {
        match self.mode {
            ReadingMode::Manga => self.position.page_index > 0 || self.has_prev_chapter(),
            ReadingMode::Webtoon => self.has_prev_chapter(),
        }
    }

    // Navigation

    pub fn next_page(&mut self) -> Step {
        if self.mode == ReadingMode::Webtoon {
            return Step::Stay;
        }
        if self.position.page_index + 1 < self.page_count() {
            self.position.page_index += 1;
            return Step::Page;
        }
        self.next_chapter()
    }

    /// Crossing back into the previous chapter lands on its last page.
    pub fn prev_page(&mut self) -> Step {
        if self.mode == ReadingMode::Webtoon {
            return Step::Stay;
        }
        if self.position.page_index > 0 {
            self.position.page_index -= 1;
            return Step::Page;
        }
        let step = self.prev_chapter();
        if step.moved() {
            self.position.page_index = self.page_count().saturating_sub(1);
        }
        step
    }

    /// Chapters without pages are skipped.
    pub fn next_chapter(&mut self) -> Step {
        match self.next_readable() {
            Some(index) => self.enter_chapter(index),
            None => Step::Stay,
        }
    }

    pub fn prev_chapter(&mut self) -> Step {
        match self.prev_readable() {
            Some(index) => self.enter_chapter(index),
            None => Step::Stay,
        }
    }

    fn enter_chapter(&mut self, chapter_index: usize) -> Step {
        self.position = Position {
            chapter_index,
            page_index: 0,
        };
        debug!(
            "Reader moved to chapter {} of {}",
            self.current_chapter().chapter_number,
            self.manga.title
        );
        Step::Chapter(self.route())
    }

    /// Jumps within the current chapter; out-of-range indexes are ignored.
    pub fn go_to_page(&mut self, page_index: usize) -> Step {
        if page_index >= self.page_count() || page_index == self.position.page_index {
            return Step::Stay;
        }
        self.position.page_index = page_index;
        Step::Page
    }

    // View state

    /// Keeps chapter and page; nothing else is reset.
    pub fn set_mode(&mut self, mode: ReadingMode) {
        self.mode = mode;
    }

    pub fn zoom_in(&mut self) -> Zoom {
        self.zoom = self.zoom.zoom_in();
        self.zoom
    }

    pub fn zoom_out(&mut self) -> Zoom {
        self.zoom = self.zoom.zoom_out();
        self.zoom
    }

    pub fn reset_zoom(&mut self) -> Zoom {
        self.zoom = Zoom::default();
        self.zoom
    }

    pub fn toggle_controls(&mut self) -> bool {
        self.controls_visible = !self.controls_visible;
        self.controls_visible
    }

    pub fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
    }

    pub fn toggle_fullscreen(&mut self, host: &dyn ReaderHost) -> Result<bool> {
        if host.is_fullscreen() {
            self.exit_fullscreen(host)?;
        } else {
            host.request_fullscreen()?;
            self.fullscreen = true;
        }
        Ok(self.fullscreen)
    }

    pub fn exit_fullscreen(&mut self, host: &dyn ReaderHost) -> Result<()> {
        if host.is_fullscreen() {
            host.exit_fullscreen()?;
        }
        self.fullscreen = false;
        Ok(())
    }

    /// Adopts a fullscreen change made by the host itself.
    pub fn sync_fullscreen(&mut self, active: bool) {
        if self.fullscreen != active {
            debug!("Host fullscreen changed to {}", active);
        }
        self.fullscreen = active;
    }

    /// Page keys only act in manga mode; Escape only leaves fullscreen.
    pub fn handle_key(&mut self, key: ReaderKey, host: &dyn ReaderHost) -> Result<Step> {
        match key {
            ReaderKey::Next if self.mode == ReadingMode::Manga => Ok(self.next_page()),
            ReaderKey::Prev if self.mode == ReadingMode::Manga => Ok(self.prev_page()),
            ReaderKey::Next | ReaderKey::Prev => Ok(Step::Stay),
            ReaderKey::ToggleFullscreen => {
                self.toggle_fullscreen(host)?;
                Ok(Step::Stay)
            }
            ReaderKey::Escape => {
                if self.fullscreen {
                    self.exit_fullscreen(host)?;
                }
                Ok(Step::Stay)
            }
        }
    }
}
