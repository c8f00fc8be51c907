// Tabula Infrastructure - SQLite Adapter
// Implements: RepositoryAdapter for any Entity

mod connection;
mod error;
mod repository;
mod row;

pub use connection::{create_pool, execute_script, SqliteConfig};
pub use error::map_sqlx_error;
pub use repository::SqliteRepository;

// Note: sqlx::Error conversion goes through map_sqlx_error because of orphan
// rules (cannot implement From<sqlx::Error> for DatastoreError here)
