// Application Layer - CRUD use cases and error translation

pub mod crud;
pub mod translator;

// Re-exports
pub use crud::{CrudService, ServiceOptions};
pub use translator::classify;
