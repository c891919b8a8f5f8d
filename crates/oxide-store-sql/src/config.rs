//! Connection configuration.
//!
//! Connection strings look like
//! `<backend>://[user[:password]@]host-or-path[:port][/database]`.
//! SQLite takes everything after `sqlite://` as a file path, with
//! `sqlite://:memory:` selecting an in-memory database.

use core::fmt;
use core::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dialect::{
    Dialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgresDialect, SqliteDialect,
};
use crate::error::{Result, SqlError};

static NETWORK_DSN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:(?P<user>[^:@/]+)(?::(?P<password>[^@]*))?@)?",
        r"(?P<host>[^:/@]+)(?::(?P<port>\d+))?",
        r"(?:/(?P<database>[^/?#]+))?$",
    ))
    .expect("DSN regex is valid")
});

/// Database backend selected by a connection string scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    MySql,
    MsSql,
    Postgres,
}

impl Backend {
    /// Resolves a scheme such as `sqlite` or `postgresql`.
    #[must_use]
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "mysql" | "mariadb" => Some(Self::MySql),
            "mssql" | "sqlserver" | "odbc" => Some(Self::MsSql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }

    /// Canonical scheme.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
            Self::MsSql => "mssql",
            Self::Postgres => "postgres",
        }
    }

    /// Returns the dialect used to render statements for this backend.
    #[must_use]
    pub fn dialect(self) -> Box<dyn Dialect> {
        match self {
            Self::Sqlite => Box::new(SqliteDialect::new()),
            Self::MySql => Box::new(MySqlDialect::new()),
            Self::MsSql => Box::new(MsSqlDialect::new()),
            Self::Postgres => Box::new(PostgresDialect::new()),
        }
    }
}

/// Returns the dialect for a backend name, falling back to the generic one.
#[must_use]
pub fn dialect_for(name: &str) -> Box<dyn Dialect> {
    Backend::from_scheme(name).map_or_else(
        || Box::new(GenericDialect::new()) as Box<dyn Dialect>,
        Backend::dialect,
    )
}

/// Parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Backend.
    pub backend: Backend,
    /// User name.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Host name, or the file path for SQLite.
    pub host: String,
    /// Port.
    pub port: Option<u16>,
    /// Database name.
    pub database: Option<String>,
}

impl ConnectionConfig {
    /// Parses a connection string.
    pub fn parse(dsn: &str) -> Result<Self> {
        let (scheme, rest) = dsn
            .split_once("://")
            .ok_or_else(|| SqlError::InvalidDsn(format!("`{dsn}` has no `<backend>://` prefix")))?;
        let backend = Backend::from_scheme(scheme)
            .ok_or_else(|| SqlError::InvalidDsn(format!("unknown backend `{scheme}`")))?;

        if backend == Backend::Sqlite {
            if rest.is_empty() {
                return Err(SqlError::InvalidDsn(String::from("sqlite needs a file path")));
            }
            return Ok(Self {
                backend,
                user: None,
                password: None,
                host: String::from(rest),
                port: None,
                database: None,
            });
        }

        let captures = NETWORK_DSN
            .captures(rest)
            .ok_or_else(|| SqlError::InvalidDsn(format!("cannot parse `{rest}`")))?;
        let text = |name: &str| captures.name(name).map(|m| m.as_str().to_owned());
        let port = captures
            .name("port")
            .map(|m| m.as_str().parse::<u16>())
            .transpose()
            .map_err(|e| SqlError::InvalidDsn(format!("bad port: {e}")))?;
        Ok(Self {
            backend,
            user: text("user"),
            password: text("password"),
            host: text("host").unwrap_or_default(),
            port,
            database: text("database"),
        })
    }

    /// Returns `true` for an in-memory SQLite database.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.backend == Backend::Sqlite && self.host == ":memory:"
    }
}

impl FromStr for ConnectionConfig {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Formats the connection string with the password masked.
impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.backend.scheme())?;
        if let Some(user) = &self.user {
            f.write_str(user)?;
            if self.password.is_some() {
                f.write_str(":***")?;
            }
            f.write_str("@")?;
        }
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        if let Some(database) = &self.database {
            write!(f, "/{database}")?;
        }
        Ok(())
    }
}
