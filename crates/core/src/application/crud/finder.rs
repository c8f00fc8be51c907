// Finder - normalizes filter, ordering and paging, then reads

use super::CrudService;
use crate::domain::{
    Criteria, Entity, EntityId, FindOptions, OrderBy, PartialResponse, QueryOptions,
    DEFAULT_ORDER, ID_FIELD,
};
use crate::error::{AppError, Result};
use crate::port::Operation;
use tracing::debug;

impl<E: Entity> CrudService<E> {
    /// Apply defaults: configured populate, `id:asc` ordering, fresh reads
    fn query_options(&self, options: FindOptions) -> Result<QueryOptions> {
        let order: OrderBy = options.order.as_deref().unwrap_or(DEFAULT_ORDER).parse()?;

        Ok(QueryOptions {
            populate: options.populate.or_else(|| self.options.populate.clone()),
            order,
            limit: options.limit,
            offset: options.offset,
            refresh: true,
        })
    }

    /// Read one entity by id
    ///
    /// Fails with `NotFound` when no entity carries the id.
    pub async fn find_one(&self, id: &str, options: FindOptions) -> Result<E> {
        let criteria = Criteria::new().eq(ID_FIELD, id);
        let query = self.query_options(options)?;

        let found = self
            .repository
            .find(&criteria, &query)
            .await
            .map_err(|e| self.translate(&e, Operation::Read, None))?;

        found.into_iter().next().ok_or_else(|| {
            debug!(entity = E::TABLE, id = %id, "Entity not found");
            AppError::not_found()
        })
    }

    /// Read every entity matching `criteria`
    pub async fn find_many(&self, criteria: &Criteria, options: FindOptions) -> Result<Vec<E>> {
        let query = self.query_options(options)?;
        debug!(entity = E::TABLE, filters = criteria.len(), order = %query.order, "Finding entities");

        self.repository
            .find(criteria, &query)
            .await
            .map_err(|e| self.translate(&e, Operation::Read, None))
    }

    /// Read one page of matching entities plus the total match count.
    ///
    /// A missing (or zero) limit falls back to the configured page size;
    /// a missing offset starts at 0.
    pub async fn find_paged(
        &self,
        criteria: &Criteria,
        options: FindOptions,
    ) -> Result<PartialResponse<E>> {
        let limit = options
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(self.options.default_page_limit);
        let offset = options.offset.unwrap_or(0);

        let query = self.query_options(FindOptions {
            limit: Some(limit),
            offset: Some(offset),
            ..options
        })?;

        let (records, count) = self
            .repository
            .find_and_count(criteria, &query)
            .await
            .map_err(|e| self.translate(&e, Operation::Read, None))?;

        Ok(PartialResponse {
            order: query.order.to_string(),
            limit,
            offset,
            count,
            records,
        })
    }

    /// Ids of a set of entities
    pub(super) fn ids(entities: &[E]) -> Vec<EntityId> {
        entities.iter().map(|e| e.id().clone()).collect()
    }
}
