use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use mangaread::admin::AdminPanel;
use mangaread::auth::{AdminPolicy, AuthService, RegisterRequest, UserSession};
use mangaread::catalog::Catalog;
use mangaread::config::Config;
use mangaread::credentials::SqliteCredentialProvider;
use mangaread::dashboard::UserDashboard;
use mangaread::database::Database;
use mangaread::library::{LibraryQuery, SortBy};
use mangaread::models::{Manga, MangaKind, MangaStatus, MangaUpdate, NewChapter, NewManga, ReaderRoute};
use mangaread::reader::{ReaderController, ReaderKey, ReadingMode};
use mangaread::storage::{FileKeyValueStore, LocalStore};
use mangaread::traits::{CredentialProvider, ReaderHost};
use mangaread::MangaReadError;

#[derive(Parser)]
#[command(name = "mangaread")]
#[command(about = "Manga and webtoon reader with favorites and reading history")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration and prepare the catalog database
    Init,
    /// Browse the catalog
    List {
        /// Match title, author or genre
        #[arg(short, long)]
        search: Option<String>,
        /// Only this genre ("all" for every genre)
        #[arg(short, long)]
        genre: Option<String>,
        /// rating, views or title
        #[arg(long, default_value = "rating")]
        sort: SortBy,
    },
    /// List every genre in the catalog
    Genres,
    /// Show one manga and its chapters
    Show { id: String },
    /// List manga by author (case-insensitive)
    ByAuthor { name: String },
    /// Create an account and sign in
    Register {
        email: String,
        password: String,
        /// Password confirmation
        confirm: String,
        /// Display name (defaults to the part of the email before '@')
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign in with email and password
    Login { email: String, password: String },
    /// Sign in with the locally configured admin credential
    AdminLogin { email: String, password: String },
    /// Sign out and clear reading history
    Logout,
    /// Show the current session
    Whoami,
    /// Manage favorites
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
    /// Show reading history, most recent first
    History,
    /// Show reading stats, continue-reading and favorites
    Dashboard,
    /// Catalog management (admin only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Open the interactive reader
    Read { manga: String, chapter: String },
}

#[derive(Subcommand)]
enum FavoriteAction {
    Add { id: String },
    Remove { id: String },
    List,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Add a manga
    Add {
        title: String,
        author: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated genres
        #[arg(long, value_delimiter = ',')]
        genres: Vec<String>,
        /// manga or webtoon
        #[arg(long = "type", default_value = "manga")]
        kind: MangaKind,
        #[arg(long, default_value = "ongoing")]
        status: MangaStatus,
        #[arg(long, default_value = "0")]
        rating: f32,
    },
    /// Edit fields of a manga
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<MangaStatus>,
        #[arg(long)]
        rating: Option<f32>,
        #[arg(long)]
        featured: Option<bool>,
        #[arg(long)]
        trending: Option<bool>,
    },
    /// Delete a manga
    Delete { id: String },
    /// Append a chapter to a manga
    AddChapter {
        manga_id: String,
        number: String,
        #[arg(long, default_value = "")]
        title: String,
        /// Page image URIs in reading order
        #[arg(required = true)]
        pages: Vec<String>,
    },
    /// Catalog totals and top rated titles
    Overview,
}

struct App {
    config: Config,
    catalog: Catalog,
    auth: Arc<AuthService>,
}

impl App {
    async fn build(config: Config) -> Result<Self> {
        let catalog = Catalog::connect(&config.catalog, &config.database).await;
        let credentials = open_credentials(&config).await;

        let store = LocalStore::new(Arc::new(FileKeyValueStore::open(&config.storage.path).await?))
            .with_history_limit(config.reader.history_limit);
        let auth = Arc::new(AuthService::new(
            credentials,
            AdminPolicy::from_config(&config.auth),
            store,
        ));

        Ok(Self {
            config,
            catalog,
            auth,
        })
    }

    async fn require_login(&self) -> Result<UserSession> {
        match self.auth.current_session().await? {
            Some(session) => Ok(session),
            None => bail!("Not signed in. Run `mangaread login <email> <password>` first."),
        }
    }
}

/// Accounts live next to the catalog; without the database there are none.
async fn open_credentials(config: &Config) -> Option<Arc<dyn CredentialProvider>> {
    if !config.catalog.remote {
        return None;
    }
    let opened = async {
        let db = Database::new(&config.database).await?;
        db.init().await?;
        Ok::<_, MangaReadError>(db)
    }
    .await;

    match opened {
        Ok(db) => Some(Arc::new(SqliteCredentialProvider::new(db.pool))),
        Err(e) => {
            warn!("Accounts unavailable: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    // Load configuration
    let config = Config::load(&cli.config)?;

    let app = App::build(config).await?;
    debug!("Catalog backend: {}", app.catalog.backend_name());

    match cli.command {
        Commands::Init => run_init(&cli.config, &app).await?,
        Commands::List { search, genre, sort } => {
            let query = LibraryQuery { search, genre, sort };
            print_manga_table(&app.catalog.browse(&query).await?);
        }
        Commands::Genres => {
            for genre in app.catalog.genres().await? {
                println!("{}", genre);
            }
        }
        Commands::Show { id } => {
            let manga = app.catalog.get_by_id(&id).await?;
            show_manga(&manga, app.auth.store().is_favorite(&id).await?);
        }
        Commands::ByAuthor { name } => {
            print_manga_table(&app.catalog.get_by_author(&name).await?);
        }
        Commands::Register {
            email,
            password,
            confirm,
            name,
        } => {
            let session = app
                .auth
                .register(RegisterRequest {
                    email,
                    password,
                    confirm_password: confirm,
                    display_name: name,
                })
                .await?;
            println!("Welcome, {}!", session.user.name);
            print_resume_hint(&app).await?;
        }
        Commands::Login { email, password } => {
            let session = app.auth.login(&email, &password).await?;
            println!("Signed in as {} ({})", session.user.name, session.role());
            print_resume_hint(&app).await?;
        }
        Commands::AdminLogin { email, password } => {
            let session = app.auth.login_admin(&email, &password).await?;
            println!("Signed in as {} ({})", session.user.name, session.role());
        }
        Commands::Logout => {
            app.auth.logout().await?;
            println!("Signed out");
        }
        Commands::Whoami => match app.auth.current_session().await? {
            Some(session) => {
                let user = &session.user;
                println!("{} <{}>", user.name, user.email);
                println!("Role:   {}", app.auth.role().await?);
                println!("Joined: {}", user.joined_date);
            }
            None => println!("Not signed in"),
        },
        Commands::Favorite { action } => run_favorite(&app, action).await?,
        Commands::History => {
            let history = app.auth.store().reading_history().await?;
            if history.is_empty() {
                println!("No reading history");
                return Ok(());
            }
            println!("{:<20} {:<15} {:<25}", "Manga", "Chapter", "Last read");
            println!("{}", "-".repeat(60));
            for entry in history {
                println!(
                    "{:<20} {:<15} {:<25}",
                    entry.manga_id,
                    entry.chapter_id,
                    entry.last_read.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::Dashboard => {
            let session = app.require_login().await?;
            let dashboard = UserDashboard::load(&app.catalog, app.auth.store()).await?;
            println!("📚 {}'s dashboard", session.user.name);
            println!(
                "Manga read: {}   Favorites: {}",
                dashboard.stats.manga_read, dashboard.stats.favorites
            );
            println!("\nContinue reading:");
            for item in &dashboard.continue_reading {
                println!(
                    "  {} - Chapter {}  (mangaread read {} {})",
                    item.manga.title, item.chapter.chapter_number, item.manga.id, item.chapter.id
                );
            }
            println!("\nFavorites:");
            print_manga_table(&dashboard.favorites);
        }
        Commands::Admin { action } => run_admin(&app, action).await?,
        Commands::Read { manga, chapter } => {
            run_reader(&app, ReaderRoute::new(manga, chapter)).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!("mangaread={}", level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn run_init(config_path: &str, app: &App) -> Result<()> {
    info!("Initializing mangaread...");

    if !Path::new(config_path).exists() {
        app.config.save(config_path)?;
        info!("Wrote default configuration to {}", config_path);
    }

    let titles = app.catalog.list_all().await?.len();
    println!(
        "✅ Catalog ready on {} backend with {} titles",
        app.catalog.backend_name(),
        titles
    );
    Ok(())
}

async fn print_resume_hint(app: &App) -> Result<()> {
    if let Some(route) = app.auth.take_resume_target().await? {
        println!(
            "Continue where you left off: mangaread read {} {}",
            route.manga_id, route.chapter_id
        );
    }
    Ok(())
}

fn print_manga_table(list: &[Manga]) {
    if list.is_empty() {
        println!("No manga found");
        return;
    }
    println!(
        "{:<15} {:<30} {:<20} {:<8} {:<8} {:<10}",
        "ID", "Title", "Author", "Rating", "Type", "Chapters"
    );
    println!("{}", "-".repeat(95));
    for manga in list {
        println!(
            "{:<15} {:<30} {:<20} {:<8.1} {:<8} {:<10}",
            manga.id,
            manga.title,
            manga.author,
            manga.rating,
            format!("{:?}", manga.kind),
            manga.chapters.len()
        );
    }
}

fn show_manga(manga: &Manga, favorite: bool) {
    println!("📖 {}{}", manga.title, if favorite { " ★" } else { "" });
    if let Some(subtitle) = &manga.subtitle {
        println!("   {}", subtitle);
    }
    println!("Author:  {}", manga.author);
    if let Some(artist) = &manga.artist {
        println!("Artist:  {}", artist);
    }
    println!("Status:  {:?}   Type: {:?}", manga.status, manga.kind);
    println!(
        "Rating:  {:.1}   Views: {}   Favorites: {}",
        manga.rating, manga.views, manga.favorites
    );
    println!("Genres:  {}", manga.genres.join(", "));
    if !manga.description.is_empty() {
        println!("\n{}\n", manga.description);
    }

    println!("{:<15} {:<10} {:<30} {:<12} {:<6}", "ID", "Number", "Title", "Released", "Pages");
    println!("{}", "-".repeat(75));
    for chapter in &manga.chapters {
        println!(
            "{:<15} {:<10} {:<30} {:<12} {:<6}",
            chapter.id,
            chapter.chapter_number,
            chapter.title,
            chapter
                .release_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            chapter.page_count()
        );
    }
}

async fn run_favorite(app: &App, action: FavoriteAction) -> Result<()> {
    let store = app.auth.store();
    match action {
        FavoriteAction::Add { id } => {
            let manga = app.catalog.get_by_id(&id).await?;
            if store.add_favorite(&id).await? {
                println!("Added '{}' to favorites", manga.title);
            } else {
                println!("'{}' is already a favorite", manga.title);
            }
        }
        FavoriteAction::Remove { id } => {
            if store.remove_favorite(&id).await? {
                println!("Removed {} from favorites", id);
            } else {
                println!("{} was not a favorite", id);
            }
        }
        FavoriteAction::List => {
            for id in store.favorites().await? {
                match app.catalog.get_by_id(&id).await {
                    Ok(manga) => println!("{:<15} {}", manga.id, manga.title),
                    Err(e) if e.is_not_found() => println!("{:<15} (no longer in catalog)", id),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
    Ok(())
}

async fn run_admin(app: &App, action: AdminAction) -> Result<()> {
    let session = app.require_login().await?;
    let panel = AdminPanel::new(&app.catalog, &session)?;

    match action {
        AdminAction::Add {
            title,
            author,
            description,
            genres,
            kind,
            status,
            rating,
        } => {
            let manga = panel
                .add_manga(NewManga {
                    title,
                    author,
                    description,
                    genres,
                    kind,
                    status,
                    rating,
                    ..Default::default()
                })
                .await?;
            println!("✅ Added '{}' with id {}", manga.title, manga.id);
        }
        AdminAction::Edit {
            id,
            title,
            author,
            description,
            status,
            rating,
            featured,
            trending,
        } => {
            let manga = panel
                .edit_manga(
                    &id,
                    MangaUpdate {
                        title,
                        author,
                        description,
                        status,
                        rating,
                        is_featured: featured,
                        is_trending: trending,
                        ..Default::default()
                    },
                )
                .await?;
            println!("✅ Updated '{}'", manga.title);
        }
        AdminAction::Delete { id } => {
            panel.remove_manga(&id).await?;
            println!("🗑️ Deleted {}", id);
        }
        AdminAction::AddChapter {
            manga_id,
            number,
            title,
            pages,
        } => {
            let chapter = panel
                .add_chapter(
                    &manga_id,
                    NewChapter {
                        chapter_number: number,
                        title,
                        release_date: None,
                        pages,
                    },
                )
                .await?;
            println!(
                "✅ Added chapter {} ({} pages) with id {}",
                chapter.chapter_number,
                chapter.page_count(),
                chapter.id
            );
        }
        AdminAction::Overview => {
            let overview = panel.overview().await?;
            println!(
                "Total manga: {}   Total chapters: {}",
                overview.total_manga, overview.total_chapters
            );
            println!("\nTop rated:");
            print_manga_table(&overview.top_rated);
        }
    }
    Ok(())
}

/// Terminal stand-in for the display host.
#[derive(Default)]
struct TerminalHost {
    fullscreen: AtomicBool,
}

impl ReaderHost for TerminalHost {
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
        debug!("Navigated to {}", route);
    }
}

async fn run_reader(app: &App, route: ReaderRoute) -> Result<()> {
    let host = Arc::new(TerminalHost::default());
    let mut controller = ReaderController::new(app.catalog.clone(), app.auth.clone(), host);

    match controller.open(route).await {
        Ok(_) => {}
        Err(MangaReadError::AuthenticationRequired(route)) => {
            println!("Sign in to read. After `mangaread login` you can resume at {}", route);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    // Session transitions from the provider reach the reader through this channel.
    let (changes_tx, mut changes) = mpsc::unbounded_channel();
    if let Some(events) = app.auth.subscribe() {
        let auth = app.auth.clone();
        tokio::spawn(async move {
            auth.follow(events, move |session| {
                let _ = changes_tx.send(session);
            })
            .await;
        });
    }

    println!("Keys: n/p or right/left page, N/P chapter, +/-/0 zoom, m/w mode, f fullscreen, esc, c controls, q quit");
    render(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                controller.sync_fullscreen();
                if !handle_input(&mut controller, line.trim()).await? {
                    break;
                }
            }
            Some(session) = changes.recv() => {
                controller.on_auth_change(session.as_ref());
                if controller.session().is_none() {
                    println!("Signed out, closing reader");
                    break;
                }
            }
        }
    }

    controller.close();
    Ok(())
}

/// Applies one line of reader input. Returns `false` when the reader should quit.
async fn handle_input(controller: &mut ReaderController, input: &str) -> Result<bool> {
    match input {
        "q" | "quit" => return Ok(false),
        "N" => {
            controller.next_chapter().await?;
        }
        "P" => {
            controller.prev_chapter().await?;
        }
        "+" | "-" | "0" | "m" | "w" | "c" => {
            if let Some(session) = controller.session_mut() {
                match input {
                    "+" => {
                        session.zoom_in();
                    }
                    "-" => {
                        session.zoom_out();
                    }
                    "0" => {
                        session.reset_zoom();
                    }
                    "m" => session.set_mode(ReadingMode::Manga),
                    "w" => session.set_mode(ReadingMode::Webtoon),
                    _ => {
                        session.toggle_controls();
                    }
                }
            }
        }
        other => match ReaderKey::from_key_name(other) {
            Some(key) => {
                controller.handle_key(key).await?;
            }
            None => {
                println!("Unknown key '{}'", other);
                return Ok(true);
            }
        },
    }
    render(controller);
    Ok(true)
}

fn render(controller: &ReaderController) {
    let Some(session) = controller.session() else {
        return;
    };
    let chapter = session.current_chapter();
    let position = session.position();

    println!();
    if session.controls_visible() {
        println!(
            "{} - Chapter {}: {}",
            session.manga().title,
            chapter.chapter_number,
            chapter.title
        );
        println!(
            "Page {}/{}  Zoom {}%  Mode {:?}{}",
            position.page_index + 1,
            chapter.page_count(),
            session.zoom().percent(),
            session.mode(),
            if session.is_fullscreen() { "  [fullscreen]" } else { "" }
        );
    }
    for page in session.visible_pages() {
        println!("  🖼  {}", page);
    }
    if session.controls_visible() {
        println!(
            "Progress {:.0}%{}{}",
            session.progress() * 100.0,
            if session.has_prev_chapter() { "  [P] previous chapter" } else { "" },
            if session.has_next_chapter() { "  [N] next chapter" } else { "" }
        );
    }
}
