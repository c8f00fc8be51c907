// Repository Adapter Port (Interface)

use crate::domain::{Criteria, Entity, QueryOptions, Record};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Violation class reported by drivers that expose typed error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatastoreCode {
    UniqueViolation,
    ForeignKeyViolation,
    UnknownProperty,
}

/// Raw failure raised by an adapter, before translation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct DatastoreError {
    /// Driver-level classification, when available
    pub code: Option<DatastoreCode>,
    /// Offending value, constraint or property reported alongside the code
    pub detail: Option<String>,
    /// Raw driver message
    pub message: String,
}

impl DatastoreError {
    /// Error known only by its message; classified by pattern
    pub fn raw(message: impl Into<String>) -> Self {
        Self {
            code: None,
            detail: None,
            message: message.into(),
        }
    }

    pub fn coded(code: DatastoreCode, detail: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            detail,
            message: message.into(),
        }
    }

    /// Rejection of a field name that does not exist on the entity
    pub fn unknown_property(table: &str, field: &str) -> Self {
        Self::coded(
            DatastoreCode::UnknownProperty,
            Some(field.to_string()),
            format!("Trying to query by not existing property {table}.{field}"),
        )
    }
}

/// Statement being executed when a datastore error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    /// Insert or update
    Write,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Driver-facing primitives against one entity type.
///
/// Every call is a single atomic statement; the layer never opens
/// transactions on top of it.
#[async_trait]
pub trait RepositoryAdapter<E: Entity>: Send + Sync {
    /// All entities matching `criteria`
    async fn find(
        &self,
        criteria: &Criteria,
        options: &QueryOptions,
    ) -> Result<Vec<E>, DatastoreError>;

    /// One page of matching entities plus the total match count
    async fn find_and_count(
        &self,
        criteria: &Criteria,
        options: &QueryOptions,
    ) -> Result<(Vec<E>, u64), DatastoreError>;

    /// Build a transient, unsaved entity from raw data.
    /// Assigns the identifier and derived fields the same way on every call.
    fn create(&self, data: &Record) -> Result<E, DatastoreError>;

    /// Insert the entity, or update it when its id is already stored
    async fn persist(&self, entity: &E) -> Result<(), DatastoreError>;

    /// Delete the entity
    async fn remove(&self, entity: &E) -> Result<(), DatastoreError>;
}
