// CRUD Service - uniform reads, writes and upserts over any entity type
//
// Split by concern:
//   finder    - find_one / find_many / find_paged
//   persister - create / save / remove / delete_by_id
//   updater   - diff-based update / update_by_id
//   merge     - unique key resolution, upsert / resert

pub mod constants;
mod finder;
mod merge;
pub mod options;
mod persister;
mod updater;

#[cfg(test)]
mod memory;

pub use options::ServiceOptions;

use crate::application::translator;
use crate::domain::{Entity, Record};
use crate::error::{AppError, Result};
use crate::port::{DatastoreError, Operation, RepositoryAdapter};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Generic CRUD service bound to one entity type.
///
/// Stateless between calls: no entity cache, no locks. Every dependency is
/// passed in at construction.
pub struct CrudService<E: Entity> {
    repository: Arc<dyn RepositoryAdapter<E>>,
    options: ServiceOptions,
}

impl<E: Entity> CrudService<E> {
    pub fn new(repository: Arc<dyn RepositoryAdapter<E>>, options: ServiceOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Route an adapter failure through the Error Translator
    fn translate(&self, err: &DatastoreError, operation: Operation, data: Option<Value>) -> AppError {
        let translated = translator::classify(err, operation, data);
        warn!(
            entity = E::TABLE,
            operation = %operation,
            reason = %translated.reason(),
            error = %err,
            "Datastore operation failed"
        );
        translated
    }
}

/// Field map of an entity
fn to_record<E: Entity>(entity: &E) -> Result<Record> {
    match serde_json::to_value(entity)? {
        Value::Object(record) => Ok(record),
        other => Err(AppError::query_failed(
            format!("{} did not serialize to a record", E::TABLE),
            Some(other),
        )),
    }
}
