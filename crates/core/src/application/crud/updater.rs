// Diff-based Updater - writes only when a targeted field actually changes

use super::{to_record, CrudService};
use crate::domain::{Entity, FindOptions, Record, ID_FIELD};
use crate::error::{AppError, Reason, Result};
use crate::port::Operation;
use serde_json::Value;
use tracing::debug;

impl<E: Entity> CrudService<E> {
    /// Apply `data` to `entity`.
    ///
    /// `data` goes through the same construction rules as `create`, so
    /// normalized values compare like stored ones. Only keys present in
    /// `data` are compared; `id` and derived fields are never compared.
    /// When nothing differs the entity comes back untouched and the adapter
    /// is not written to. Otherwise the entity is saved and re-read, so
    /// adapter-derived fields (update timestamps) are current.
    pub async fn update(&self, entity: E, data: &Record) -> Result<E> {
        if let Some(unknown) = data.keys().find(|key| !E::has_field(key)) {
            return Err(AppError::bad_request(Reason::PropertyNonExistant, unknown));
        }

        let transient = self
            .repository
            .create(data)
            .map_err(|e| self.translate(&e, Operation::Write, Some(Value::Object(data.clone()))))?;
        let incoming = to_record(&transient)?;
        let mut current = to_record(&entity)?;

        let mut changed = Vec::new();
        for key in data.keys() {
            if key == ID_FIELD || E::is_derived(key) {
                continue;
            }
            let value = incoming.get(key).cloned().unwrap_or(Value::Null);
            if current.get(key) != Some(&value) {
                current.insert(key.clone(), value);
                changed.push(key.as_str());
            }
        }

        if changed.is_empty() {
            debug!(entity = E::TABLE, id = %entity.id(), "Update skipped, nothing changed");
            return Ok(entity);
        }

        let updated: E = serde_json::from_value(Value::Object(current))?;
        self.save(&updated).await?;
        debug!(entity = E::TABLE, id = %updated.id(), fields = ?changed, "Entity updated");

        self.find_one(updated.id(), FindOptions::default()).await
    }

    /// Read the entity carrying `id` and apply `data` to it
    pub async fn update_by_id(&self, id: &str, data: &Record) -> Result<E> {
        let target = self.find_one(id, FindOptions::default()).await?;
        self.update(target, data).await
    }
}
