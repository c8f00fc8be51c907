// Persister - insert/update/delete wrappers with error translation

use super::CrudService;
use crate::domain::{Entity, FindOptions, Record};
use crate::error::{AppError, Result};
use crate::port::Operation;
use serde_json::Value;
use tracing::{debug, info};

impl<E: Entity> CrudService<E> {
    /// Build an entity from raw data, persist it and return the stored state
    pub async fn create(&self, data: Record) -> Result<E> {
        let entity = self
            .repository
            .create(&data)
            .map_err(|e| self.translate(&e, Operation::Write, Some(Value::Object(data.clone()))))?;

        self.save(&entity).await?;
        info!(entity = E::TABLE, id = %entity.id(), "Entity created");

        self.find_one(entity.id(), FindOptions::default()).await
    }

    /// Insert or update an entity.
    ///
    /// An entity without identifier is treated as undefined and rejected
    /// before the adapter is reached.
    pub async fn save(&self, entity: &E) -> Result<()> {
        if entity.id().trim().is_empty() {
            return Err(AppError::entity_undefined());
        }

        debug!(entity = E::TABLE, id = %entity.id(), "Persisting entity");
        self.repository
            .persist(entity)
            .await
            .map_err(|e| self.translate(&e, Operation::Write, serde_json::to_value(entity).ok()))
    }

    /// Delete an entity, returning the removed snapshot
    pub async fn remove(&self, entity: E) -> Result<E> {
        self.repository
            .remove(&entity)
            .await
            .map_err(|e| self.translate(&e, Operation::Delete, serde_json::to_value(&entity).ok()))?;

        info!(entity = E::TABLE, id = %entity.id(), "Entity removed");
        Ok(entity)
    }

    /// Delete the entity carrying `id`
    pub async fn delete_by_id(&self, id: &str) -> Result<E> {
        let entity = self.find_one(id, FindOptions::default()).await?;
        self.remove(entity).await
    }
}
