// Environment configuration

use std::path::PathBuf;
use tabula_infra_sqlite::SqliteConfig;

pub const DEFAULT_DB_PATH: &str = "~/.tabula/tabula.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Development: pretty formatting with colors
    Pretty,
    /// Production: JSON structured logging
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub db_path: PathBuf,
    pub log_format: LogFormat,
    pub max_connections: u32,
}

impl DemoConfig {
    /// Read `TABULA_DB_PATH`, `TABULA_LOG_FORMAT` and `TABULA_MAX_CONNECTIONS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let raw_path = lookup("TABULA_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let db_path = PathBuf::from(shellexpand::tilde(&raw_path).into_owned());

        let log_format = match lookup("TABULA_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let max_connections = lookup("TABULA_MAX_CONNECTIONS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        Self {
            db_path,
            log_format,
            max_connections,
        }
    }

    pub fn sqlite(&self) -> SqliteConfig {
        SqliteConfig::for_path(&self.db_path).with_max_connections(self.max_connections)
    }
}
