// Upsert / Resert Orchestrator
//
// Check-then-act with one bounded retry: the datastore's unique constraint
// decides concurrent inserts, the loser re-reads and returns the winner.

use super::constants::MAX_MERGE_ATTEMPTS;
use super::{to_record, CrudService};
use crate::domain::{Criteria, Entity, FindOptions, Record, UniqueKey};
use crate::error::{AppError, Result};
use crate::port::Operation;
use serde_json::Value;
use tracing::{debug, warn};

/// What to do when the unique key already matches an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeMode {
    /// Apply the data to the match (upsert)
    Update,
    /// Return the match unchanged (resert)
    Keep,
}

impl<E: Entity> CrudService<E> {
    /// Explicit key if given, otherwise the configured default.
    ///
    /// Fails with `NotImplemented` when neither exists, so upserts never
    /// run an unbounded equality scan.
    pub fn resolve_unique_key(&self, explicit: Option<&UniqueKey>) -> Result<UniqueKey> {
        explicit
            .or(self.options.unique_key.as_ref())
            .cloned()
            .ok_or_else(AppError::unique_key_missing)
    }

    /// Key clause over `data` as `create` would store it.
    ///
    /// Key fields left out of `data` take the value construction gives them
    /// (serde default, derived timestamp), so repeated merges with the same
    /// partial data find the row the first one created.
    fn key_clause(&self, unique_key: &UniqueKey, data: &Record) -> Result<Criteria> {
        let transient = self
            .repository
            .create(data)
            .map_err(|e| self.translate(&e, Operation::Write, Some(Value::Object(data.clone()))))?;
        Ok(unique_key.clause(&to_record(&transient)?))
    }

    /// Create when the unique key matches nothing, otherwise update the match
    pub async fn upsert(&self, data: Record, unique_key: Option<&UniqueKey>) -> Result<E> {
        self.merge(data, unique_key, MergeMode::Update).await
    }

    /// Create when the unique key matches nothing, otherwise return the match unchanged
    pub async fn resert(&self, data: Record, unique_key: Option<&UniqueKey>) -> Result<E> {
        self.merge(data, unique_key, MergeMode::Keep).await
    }

    async fn merge(
        &self,
        data: Record,
        unique_key: Option<&UniqueKey>,
        mode: MergeMode,
    ) -> Result<E> {
        let unique_key = self.resolve_unique_key(unique_key)?;
        let clause = self.key_clause(&unique_key, &data)?;
        let mut mode = mode;
        let mut attempt = 1;

        loop {
            let mut matches = self.find_many(&clause, FindOptions::default()).await?;

            if matches.len() > 1 {
                let ids = Self::ids(&matches);
                warn!(
                    entity = E::TABLE,
                    unique_key = ?unique_key.fields(),
                    matches = ?ids,
                    "Unique key matches more than one entity"
                );
                return Err(AppError::ambiguous_unique_key(unique_key.fields().to_vec(), ids));
            }

            if let Some(existing) = matches.pop() {
                return match mode {
                    MergeMode::Update => self.update(existing, &data).await,
                    MergeMode::Keep => {
                        debug!(entity = E::TABLE, id = %existing.id(), "Returning existing match");
                        Ok(existing)
                    }
                };
            }

            match self.create(data.clone()).await {
                Ok(created) => return Ok(created),
                Err(err) if attempt < MAX_MERGE_ATTEMPTS => {
                    // Most likely a concurrent creator won between read and insert
                    warn!(
                        entity = E::TABLE,
                        attempt,
                        reason = %err.reason(),
                        "Create failed during merge, retrying without update"
                    );
                    mode = MergeMode::Keep;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
