use std::env;
use std::time::Duration;

/// Connection settings for the tutorplan database.
///
/// The URL comes from `TUTORPLAN_DATABASE_URL` (or the CLI/config file
/// layered on top by the binary). Pool sizing has fixed defaults that tests
/// and the server can override with the `with_*` builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL, optionally with `?query` parameters.
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/tutorplan";

    /// Environment variable consulted by [`DbConfig::from_env`].
    pub const ENV_VAR: &str = "TUTORPLAN_DATABASE_URL";

    /// Database used for `CREATE DATABASE` / `DROP DATABASE`.
    pub const MAINTENANCE_DB: &str = "postgres";

    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn from_env() -> Self {
        Self::new(env::var(Self::ENV_VAR).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned()))
    }

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Split the URL into `(server, database, query)`.
    ///
    /// `postgresql://h:5432/tutorplan?sslmode=require` becomes
    /// `("postgresql://h:5432", "tutorplan", "?sslmode=require")`. A URL with
    /// no path after the authority yields an empty database.
    fn parts(&self) -> (&str, &str, &str) {
        let (base, query) = match self.database_url.find('?') {
            Some(pos) => self.database_url.split_at(pos),
            None => (self.database_url.as_str(), ""),
        };
        let authority_start = base.find("://").map_or(0, |p| p + 3);
        match base[authority_start..].find('/') {
            Some(rel) => {
                let slash = authority_start + rel;
                (&base[..slash], &base[slash + 1..], query)
            }
            None => (base, "", query),
        }
    }

    /// Database name from the URL path, if there is one.
    pub fn database_name(&self) -> Option<&str> {
        let (_, name, _) = self.parts();
        (!name.is_empty()).then_some(name)
    }

    /// The same server and query parameters, pointed at another database.
    pub fn with_database(&self, name: &str) -> Self {
        let (server, _, query) = self.parts();
        Self {
            database_url: format!("{server}/{name}{query}"),
            ..self.clone()
        }
    }

    /// Settings for the `postgres` maintenance database on the same server.
    pub fn maintenance(&self) -> Self {
        self.with_database(Self::MAINTENANCE_DB)
            .with_max_connections(1)
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// True when `name` can be spliced into `CREATE DATABASE` unquoted.
pub fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
