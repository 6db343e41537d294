use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
    pub auth: AuthConfig,
    pub reader: ReaderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file backing the local key-value store.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Use the document store; when false or unreachable the in-memory list is used.
    pub remote: bool,
    /// Seed the in-memory fallback with the bundled sample titles.
    pub seed_sample: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Emails that resolve to the admin role when signed in.
    pub admin_emails: Vec<String>,
    /// Local-only admin login, checked without the credential provider.
    pub local_admin: Option<LocalAdminConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalAdminConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    pub history_limit: usize,
}

impl Config {
    /// Defaults, then the TOML file if it exists, then `MANGAREAD__SECTION__KEY` variables.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("MANGAREAD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_emails"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite:data/mangaread.db".to_string(),
                max_connections: 5,
            },
            storage: StorageConfig {
                path: "data/local_storage.json".to_string(),
            },
            catalog: CatalogConfig {
                remote: true,
                seed_sample: true,
            },
            auth: AuthConfig {
                admin_emails: Vec::new(),
                local_admin: None,
            },
            reader: ReaderConfig { history_limit: 50 },
        }
    }
}
