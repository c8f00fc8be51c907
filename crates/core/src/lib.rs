// Tabula Core - Domain Types, Ports & CRUD Service
// NO infrastructure dependencies: datastores plug in through port::RepositoryAdapter

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{CrudService, ServiceOptions};
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
