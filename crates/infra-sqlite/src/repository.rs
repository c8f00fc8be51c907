// SQLite RepositoryAdapter Implementation
//
// Generic over the entity: tables and columns come from Entity::TABLE and
// Entity::FIELDS. The table must declare `id` as PRIMARY KEY.

use crate::error::map_sqlx_error;
use crate::row::{bind_all, decode_row, display_value, Param};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::marker::PhantomData;
use std::sync::Arc;
use tabula_core::domain::{Criteria, Entity, FieldKind, QueryOptions, Record, ID_FIELD};
use tabula_core::port::{
    DatastoreCode, DatastoreError, IdProvider, Operation, RepositoryAdapter, TimeProvider,
};
use tracing::debug;

/// Set at construction, preserved on update
const CREATED_FIELD: &str = "created";
/// Set at construction, refreshed by every update
const UPDATED_FIELD: &str = "updated";

pub struct SqliteRepository<E> {
    pool: SqlitePool,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SqliteRepository<E> {
    pub fn new(
        pool: SqlitePool,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            pool,
            id_provider,
            time_provider,
            _entity: PhantomData,
        }
    }

    /// Reject unknown criteria, order and populate fields before any SQL runs
    fn validate(criteria: &Criteria, options: &QueryOptions) -> Result<(), DatastoreError> {
        let populate = options.populate.iter().flat_map(|p| p.fields());
        let unknown = criteria
            .fields()
            .chain(std::iter::once(&options.order.field))
            .chain(populate)
            .find(|name| !E::has_field(name));

        match unknown {
            Some(name) => Err(DatastoreError::unknown_property(E::TABLE, name)),
            None => Ok(()),
        }
    }

    /// ` WHERE ...` (empty when there are no criteria) plus its parameters
    fn where_clause(criteria: &Criteria) -> Result<(String, Vec<Param>), DatastoreError> {
        let mut conditions = Vec::with_capacity(criteria.len());
        let mut params = Vec::new();

        for (name, value) in criteria.iter() {
            let field =
                E::field(name).ok_or_else(|| DatastoreError::unknown_property(E::TABLE, name))?;
            let column = quote(field.name);

            match value {
                Value::Null => conditions.push(format!("{column} IS NULL")),
                Value::Array(values) if values.is_empty() => conditions.push("0 = 1".to_string()),
                Value::Array(values) => {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    conditions.push(format!("{column} IN ({placeholders})"));
                    params.extend(values.iter().map(|v| Param::from_value(field.kind, v)));
                }
                Value::Object(relation) if relation.contains_key(ID_FIELD) => {
                    conditions.push(format!("{column} = ?"));
                    params.push(Param::from_value(field.kind, &relation[ID_FIELD]));
                }
                other => {
                    conditions.push(format!("{column} = ?"));
                    params.push(Param::from_value(field.kind, other));
                }
            }
        }

        if conditions.is_empty() {
            Ok((String::new(), params))
        } else {
            Ok((format!(" WHERE {}", conditions.join(" AND ")), params))
        }
    }

    fn select_sql(where_sql: &str, options: &QueryOptions) -> String {
        let columns = E::FIELDS
            .iter()
            .map(|f| quote(f.name))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "SELECT {columns} FROM {}{where_sql} ORDER BY {} {}",
            quote(E::TABLE),
            quote(&options.order.field),
            options.order.direction.as_sql()
        );
        // Stable paging when the order field has ties
        if options.order.field != ID_FIELD {
            sql.push_str(&format!(", {} ASC", quote(ID_FIELD)));
        }
        if options.limit.is_some() || options.offset.is_some() {
            // SQLite reads a negative LIMIT as unbounded
            let limit = options.limit.map(clamp).unwrap_or(-1);
            let offset = options.offset.map(clamp).unwrap_or(0);
            sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
        }
        sql
    }

    async fn select(
        conn: &mut SqliteConnection,
        criteria: &Criteria,
        options: &QueryOptions,
    ) -> Result<Vec<E>, DatastoreError> {
        let (where_sql, params) = Self::where_clause(criteria)?;
        let sql = Self::select_sql(&where_sql, options);
        debug!(entity = E::TABLE, sql = %sql, "Executing query");

        let rows = bind_all(sqlx::query(&sql), params)
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| -> Result<E, DatastoreError> {
                let record = decode_row(row, E::FIELDS)?;
                serde_json::from_value(Value::Object(record))
                    .map_err(|e| DatastoreError::raw(format!("cannot decode {}: {e}", E::TABLE)))
            })
            .collect()
    }

    async fn count(
        conn: &mut SqliteConnection,
        sql: &str,
        params: Vec<Param>,
    ) -> Result<u64, DatastoreError> {
        let row = bind_all(sqlx::query(sql), params)
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        let count: i64 = row.try_get(0).map_err(map_sqlx_error)?;
        Ok(count.max(0) as u64)
    }

    /// Attach the offending value or relation to a coded driver error
    async fn enrich(&self, err: DatastoreError, record: &Record, operation: Operation) -> DatastoreError {
        if err.detail.is_some() {
            return err;
        }

        let detail = match err.code {
            Some(DatastoreCode::UniqueViolation) => duplicate_value(&err.message, record),
            Some(DatastoreCode::ForeignKeyViolation) => {
                let lookup = match operation {
                    Operation::Delete => self.blocking_reference(record).await,
                    _ => self.missing_reference(record).await,
                };
                lookup.unwrap_or_else(|e| {
                    debug!(entity = E::TABLE, error = %e, "Foreign key lookup failed");
                    None
                })
            }
            _ => None,
        };

        DatastoreError { detail, ..err }
    }

    async fn foreign_keys(
        conn: &mut SqliteConnection,
        sql: &str,
    ) -> Result<Vec<ForeignKey>, DatastoreError> {
        let rows = sqlx::query(sql)
            .bind(E::TABLE)
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| -> Result<ForeignKey, DatastoreError> {
                let to_column: Option<String> = row.try_get("to_column").map_err(map_sqlx_error)?;
                Ok(ForeignKey {
                    other_table: row.try_get("other_table").map_err(map_sqlx_error)?,
                    from_column: row.try_get("from_column").map_err(map_sqlx_error)?,
                    to_column: to_column.unwrap_or_else(|| ID_FIELD.to_string()),
                })
            })
            .collect()
    }

    /// `parent.column` of the first reference in `record` that points nowhere
    async fn missing_reference(&self, record: &Record) -> Result<Option<String>, DatastoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        let references = Self::foreign_keys(
            &mut *conn,
            r#"SELECT "table" AS other_table, "from" AS from_column, "to" AS to_column
               FROM pragma_foreign_key_list(?)"#,
        )
        .await?;

        for fk in references {
            let value = match record.get(&fk.from_column) {
                Some(Value::Null) | None => continue,
                Some(value) => value,
            };
            let kind = E::field(&fk.from_column).map(|f| f.kind).unwrap_or(FieldKind::Text);

            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?",
                quote(&fk.other_table),
                quote(&fk.to_column)
            );
            if Self::count(&mut *conn, &sql, vec![Param::from_value(kind, value)]).await? == 0 {
                return Ok(Some(format!("{}.{}", fk.other_table, fk.to_column)));
            }
        }
        Ok(None)
    }

    /// `child.column` of the first table still referencing `record`
    async fn blocking_reference(&self, record: &Record) -> Result<Option<String>, DatastoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        let references = Self::foreign_keys(
            &mut *conn,
            r#"SELECT m.name AS other_table, p."from" AS from_column, p."to" AS to_column
               FROM sqlite_master m JOIN pragma_foreign_key_list(m.name) p
               WHERE m.type = 'table' AND p."table" = ?"#,
        )
        .await?;

        for fk in references {
            let value = match record.get(&fk.to_column) {
                Some(Value::Null) | None => continue,
                Some(value) => value,
            };
            let kind = E::field(&fk.to_column).map(|f| f.kind).unwrap_or(FieldKind::Text);

            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?",
                quote(&fk.other_table),
                quote(&fk.from_column)
            );
            if Self::count(&mut *conn, &sql, vec![Param::from_value(kind, value)]).await? > 0 {
                return Ok(Some(format!("{}.{}", fk.other_table, fk.from_column)));
            }
        }
        Ok(None)
    }
}

/// One foreign key, seen from `E`'s table
struct ForeignKey {
    /// Referenced table (outgoing) or referencing table (incoming)
    other_table: String,
    /// Referencing column
    from_column: String,
    /// Referenced column
    to_column: String,
}

#[async_trait]
impl<E: Entity> RepositoryAdapter<E> for SqliteRepository<E> {
    async fn find(
        &self,
        criteria: &Criteria,
        options: &QueryOptions,
    ) -> Result<Vec<E>, DatastoreError> {
        Self::validate(criteria, options)?;
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Self::select(&mut *conn, criteria, options).await
    }

    async fn find_and_count(
        &self,
        criteria: &Criteria,
        options: &QueryOptions,
    ) -> Result<(Vec<E>, u64), DatastoreError> {
        Self::validate(criteria, options)?;
        let (where_sql, params) = Self::where_clause(criteria)?;
        let sql = format!("SELECT COUNT(*) FROM {}{where_sql}", quote(E::TABLE));

        // Page and total read from the same snapshot
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let records = Self::select(&mut *tx, criteria, options).await?;
        let count = Self::count(&mut *tx, &sql, params).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok((records, count))
    }

    fn create(&self, data: &Record) -> Result<E, DatastoreError> {
        if let Some(unknown) = data.keys().find(|name| !E::has_field(name)) {
            return Err(DatastoreError::unknown_property(E::TABLE, unknown));
        }

        let mut record = data.clone();
        let has_id = matches!(record.get(ID_FIELD), Some(Value::String(id)) if !id.trim().is_empty());
        if !has_id {
            record.insert(ID_FIELD.to_string(), Value::String(self.id_provider.generate_id()));
        }

        // Millisecond timestamps on integer derived fields
        let now = self.time_provider.now_millis();
        for name in E::DERIVED_FIELDS {
            let is_timestamp = E::field(name).is_some_and(|f| f.kind == FieldKind::Integer);
            let missing = matches!(record.get(*name), Some(Value::Null) | None);
            if is_timestamp && missing {
                record.insert(name.to_string(), Value::from(now));
            }
        }

        serde_json::from_value(Value::Object(record))
            .map_err(|e| DatastoreError::raw(format!("cannot build {}: {e}", E::TABLE)))
    }

    async fn persist(&self, entity: &E) -> Result<(), DatastoreError> {
        let record = entity_record(entity)?;
        let now = self.time_provider.now_millis();

        let columns: Vec<String> = E::FIELDS.iter().map(|f| quote(f.name)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let assignments: Vec<String> = E::FIELDS
            .iter()
            .filter(|f| f.name != ID_FIELD && f.name != CREATED_FIELD)
            .map(|f| {
                if f.name == UPDATED_FIELD && f.kind == FieldKind::Integer {
                    format!("{} = {now}", quote(f.name))
                } else {
                    format!("{0} = excluded.{0}", quote(f.name))
                }
            })
            .collect();
        let on_conflict = if assignments.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", assignments.join(", "))
        };

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders}) ON CONFLICT({}) {on_conflict}",
            quote(E::TABLE),
            columns.join(", "),
            quote(ID_FIELD)
        );
        let params = E::FIELDS
            .iter()
            .map(|f| Param::from_value(f.kind, record.get(f.name).unwrap_or(&Value::Null)))
            .collect();

        debug!(entity = E::TABLE, id = %entity.id(), "Persisting row");
        let result = bind_all(sqlx::query(&sql), params).execute(&self.pool).await;
        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(self.enrich(map_sqlx_error(e), &record, Operation::Write).await),
        }
    }

    async fn remove(&self, entity: &E) -> Result<(), DatastoreError> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", quote(E::TABLE), quote(ID_FIELD));

        debug!(entity = E::TABLE, id = %entity.id(), "Deleting row");
        let result = sqlx::query(&sql).bind(entity.id().clone()).execute(&self.pool).await;
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let record = entity_record(entity)?;
                Err(self.enrich(map_sqlx_error(e), &record, Operation::Delete).await)
            }
        }
    }
}

fn entity_record<E: Entity>(entity: &E) -> Result<Record, DatastoreError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(DatastoreError::raw(format!("{} is not a record", E::TABLE))),
        Err(e) => Err(DatastoreError::raw(format!("cannot encode {}: {e}", E::TABLE))),
    }
}

/// `u64` paging bound as a SQLite integer, saturating at `i64::MAX`
fn clamp(bound: u64) -> i64 {
    i64::try_from(bound).unwrap_or(i64::MAX)
}

/// Quote an identifier
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Values of the columns named in `UNIQUE constraint failed: t.a, t.b`,
/// joined with `-`
fn duplicate_value(message: &str, record: &Record) -> Option<String> {
    let (_, columns) = message.split_once(": ")?;
    let values = columns
        .split(',')
        .map(|column| {
            let column = column.trim();
            let name = column.rsplit('.').next().unwrap_or(column);
            record.get(name).map(display_value)
        })
        .collect::<Option<Vec<_>>>()?;

    if values.is_empty() {
        None
    } else {
        Some(values.join("-"))
    }
}
