use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub max_age_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup("STORAGE").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StorageKind::Postgres,
            Some("memory") => StorageKind::Memory,
            Some(other) => anyhow::bail!("unknown STORAGE backend: {other}"),
        };

        let database_url = lookup("DATABASE_URL");
        if storage == StorageKind::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORAGE=postgres");
        }

        let port = match lookup("APP_PORT") {
            Some(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            None => 8080,
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            None => 10,
        };
        anyhow::ensure!(db_max_connections > 0, "DB_MAX_CONNECTIONS must be at least 1");

        let cookie_name = lookup("SESSION_COOKIE_NAME").unwrap_or_else(|| "sessionId".into());
        anyhow::ensure!(
            is_cookie_token(&cookie_name),
            "SESSION_COOKIE_NAME is not a valid cookie name: {cookie_name:?}"
        );

        let max_age_days = match lookup("SESSION_COOKIE_MAX_AGE_DAYS") {
            Some(v) => v
                .parse::<i64>()
                .context("SESSION_COOKIE_MAX_AGE_DAYS must be a number of days")?,
            None => 7,
        };
        anyhow::ensure!(
            (1..=MAX_SESSION_COOKIE_DAYS).contains(&max_age_days),
            "SESSION_COOKIE_MAX_AGE_DAYS must be between 1 and {MAX_SESSION_COOKIE_DAYS}"
        );

        Ok(Self {
            storage,
            database_url,
            db_max_connections,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            session: SessionConfig {
                cookie_name,
                max_age_days,
            },
        })
    }
}

pub const MAX_SESSION_COOKIE_DAYS: i64 = 3650;

/// RFC 6265 cookie-name token: visible ASCII minus separators.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
}
