use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Default location of the optional settings file.
pub const DEFAULT_CONFIG_FILE: &str = "pgassist.toml";

pub const POSTGRESQL_ERROR_CODES_URL: &str =
    "https://www.postgresql.org/docs/current/errcodes-appendix.html";

/// Connection defaults used to fill whatever a descriptor leaves out.
///
/// Keys follow libpq naming so `PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD`
/// and `PGDATABASE` override the file values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDefaults {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_database() -> String {
    "postgres".to_string()
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: default_database(),
        }
    }
}

/// Settings for the documentation fetcher used by error-code enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsSettings {
    #[serde(default = "default_error_codes_url")]
    pub error_codes_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_error_codes_url() -> String {
    POSTGRESQL_ERROR_CODES_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "PostgreSQL-Agent/1.0 (Documentation Helper)".to_string()
}

impl Default for DocsSettings {
    fn default() -> Self {
        Self {
            error_codes_url: default_error_codes_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Everything the toolkit reads from its environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Settings {
    pub connection: ConnectionDefaults,
    pub docs: DocsSettings,
}

impl Settings {
    /// Load from `pgassist.toml` (if present) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path, None)
    }

    /// Load from an explicit file and, when given, an explicit environment map
    /// instead of the process environment.
    pub fn load_from(
        path: &Path,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("PG")
                    .prefix_separator("")
                    .source(env),
            )
            .build()?;

        let connection: ConnectionDefaults = settings.clone().try_deserialize()?;
        let docs = match settings.get::<DocsSettings>("docs") {
            Ok(docs) => docs,
            Err(ConfigError::NotFound(_)) => DocsSettings::default(),
            Err(e) => return Err(e),
        };

        log::debug!(
            "Loaded settings (host={}, port={}, database={})",
            connection.host,
            connection.port,
            connection.database
        );

        Ok(Self { connection, docs })
    }
}
