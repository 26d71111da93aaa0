//! Runtime configuration, read from the environment and the command line.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use directories::ProjectDirs;
use tracing::info;

use crate::context::AppContext;
use crate::store::{Database, MemoryStore};

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const PORT_VAR: &str = "PORT";
const DEFAULT_PORT: u16 = 8080;

/// Where tasks and logs are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseUrl {
    Sqlite(PathBuf),
    SqliteInMemory,
    Memory,
    /// Recognized so it can be reported, but there is no driver for it.
    Postgres(String),
}

impl DatabaseUrl {
    /// Parse a connection string. The legacy `postgres://` scheme is
    /// rewritten to `postgresql://`. SQLite urls follow the usual convention:
    /// `sqlite:///rel.db` is relative, `sqlite:////abs.db` is absolute.
    pub fn parse(url: &str) -> DatabaseUrl {
        if let Some(rest) = url.strip_prefix("postgres://") {
            return DatabaseUrl::Postgres(format!("postgresql://{}", rest));
        }
        if url.starts_with("postgresql://") {
            return DatabaseUrl::Postgres(url.to_string());
        }
        match url {
            "memory:" => DatabaseUrl::Memory,
            "sqlite://" | "sqlite::memory:" | "sqlite://:memory:" => DatabaseUrl::SqliteInMemory,
            _ => {
                let path = url
                    .strip_prefix("sqlite:///")
                    .or_else(|| url.strip_prefix("sqlite://"))
                    .or_else(|| url.strip_prefix("sqlite:"))
                    .unwrap_or(url);
                DatabaseUrl::Sqlite(PathBuf::from(path))
            }
        }
    }

    /// Backend name, safe to log. The url itself may carry credentials.
    pub fn backend(&self) -> &'static str {
        match self {
            DatabaseUrl::Sqlite(_) => "sqlite",
            DatabaseUrl::SqliteInMemory => "sqlite-memory",
            DatabaseUrl::Memory => "memory",
            DatabaseUrl::Postgres(_) => "postgresql",
        }
    }

    /// Build the stores this url points at.
    pub fn connect(&self) -> Result<AppContext> {
        match self {
            DatabaseUrl::Sqlite(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory {}.", parent.display())
                    })?;
                }
                let db = Arc::new(Database::open(path)?);
                Ok(AppContext::new(db.clone(), db))
            }
            DatabaseUrl::SqliteInMemory => {
                let db = Arc::new(Database::open_in_memory()?);
                Ok(AppContext::new(db.clone(), db))
            }
            DatabaseUrl::Memory => {
                let store = Arc::new(MemoryStore::new());
                Ok(AppContext::new(store.clone(), store))
            }
            DatabaseUrl::Postgres(_) => {
                bail!(
                    "PostgreSQL urls are recognized but this build only ships the SQLite store."
                )
            }
        }
    }
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseUrl,
}

impl Config {
    /// Resolve the database: the command line flag wins, then
    /// `DATABASE_URL`, then a file in the user's data directory.
    pub fn load(database_flag: Option<PathBuf>) -> Result<Config> {
        let database = match database_flag {
            Some(path) => DatabaseUrl::Sqlite(path),
            None => match std::env::var(DATABASE_URL_VAR) {
                Ok(url) if !url.is_empty() => DatabaseUrl::parse(&url),
                _ => {
                    let path = default_database_file()
                        .ok_or(anyhow!("Failed to find a data directory."))?;
                    DatabaseUrl::Sqlite(path)
                }
            },
        };
        info!(backend = database.backend(), "loaded configuration");
        Ok(Config { database })
    }
}

fn default_database_file() -> Option<PathBuf> {
    ProjectDirs::from("com", "gozque", "tally").map(|dirs| dirs.data_dir().join("tally.db"))
}

/// Listen address for the web server: an explicit `--bind`, or every
/// interface on `PORT`.
pub fn bind_address(flag: Option<SocketAddr>) -> Result<SocketAddr> {
    if let Some(addr) = flag {
        return Ok(addr);
    }
    let port = match std::env::var(PORT_VAR) {
        Ok(port) => port
            .parse::<u16>()
            .with_context(|| format!("{} must be a port number, got {:?}.", PORT_VAR, port))?,
        Err(_) => DEFAULT_PORT,
    };
    Ok(SocketAddr::from(([0, 0, 0, 0], port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_postgres_scheme_is_normalized() {
        assert_eq!(
            DatabaseUrl::parse("postgres://u:p@host/db"),
            DatabaseUrl::Postgres("postgresql://u:p@host/db".to_string())
        );
        assert_eq!(
            DatabaseUrl::parse("postgresql://host/db"),
            DatabaseUrl::Postgres("postgresql://host/db".to_string())
        );
    }

    #[test]
    fn sqlite_urls() {
        assert_eq!(
            DatabaseUrl::parse("sqlite:///task.db"),
            DatabaseUrl::Sqlite(PathBuf::from("task.db"))
        );
        assert_eq!(
            DatabaseUrl::parse("sqlite:///data/task.db"),
            DatabaseUrl::Sqlite(PathBuf::from("data/task.db"))
        );
        assert_eq!(
            DatabaseUrl::parse("sqlite:////var/lib/tally.db"),
            DatabaseUrl::Sqlite(PathBuf::from("/var/lib/tally.db"))
        );
        assert_eq!(
            DatabaseUrl::parse("task.db"),
            DatabaseUrl::Sqlite(PathBuf::from("task.db"))
        );
        assert_eq!(DatabaseUrl::parse("sqlite::memory:"), DatabaseUrl::SqliteInMemory);
        assert_eq!(DatabaseUrl::parse("sqlite://"), DatabaseUrl::SqliteInMemory);
        assert_eq!(DatabaseUrl::parse("memory:"), DatabaseUrl::Memory);
    }

    #[test]
    fn postgres_cannot_connect() {
        let err = DatabaseUrl::parse("postgres://host/db").connect().err().unwrap();
        assert!(err.to_string().contains("PostgreSQL"));
    }

    #[test]
    fn sqlite_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tally.db");
        DatabaseUrl::Sqlite(path.clone()).connect().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn explicit_bind_wins() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(bind_address(Some(addr)).unwrap(), addr);
    }
}
