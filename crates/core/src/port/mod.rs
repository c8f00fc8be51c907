// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod repository;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use repository::{DatastoreCode, DatastoreError, Operation, RepositoryAdapter};
pub use time_provider::TimeProvider;
