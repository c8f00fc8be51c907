// In-memory repository adapter for service tests

use crate::domain::{Criteria, Direction, Entity, QueryOptions, Record, ID_FIELD};
use crate::port::{DatastoreError, RepositoryAdapter};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Entity used across the service tests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub id: String,
    pub created: i64,
    pub updated: i64,
    pub email: String,
    pub name: String,
    pub tier: i64,
}

impl Entity for Customer {
    const TABLE: &'static str = "customers";
    const FIELDS: &'static [crate::domain::Field] = &[
        crate::domain::Field::text("id"),
        crate::domain::Field::integer("created"),
        crate::domain::Field::integer("updated"),
        crate::domain::Field::text("email"),
        crate::domain::Field::text("name"),
        crate::domain::Field::integer("tier"),
    ];

    fn id(&self) -> &String {
        &self.id
    }
}

pub struct MemoryRepository<E> {
    rows: Mutex<Vec<Record>>,
    unique: Vec<&'static str>,
    /// Row stored right before the next insert, as if another caller won the race
    racer: Mutex<Option<Record>>,
    failures: Mutex<Vec<DatastoreError>>,
    next_id: AtomicU64,
    clock: AtomicI64,
    writes: AtomicUsize,
    finds: AtomicUsize,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            unique: Vec::new(),
            racer: Mutex::new(None),
            failures: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            clock: AtomicI64::new(1_000),
            writes: AtomicUsize::new(0),
            finds: AtomicUsize::new(0),
            _entity: PhantomData,
        }
    }

    pub fn with_unique(mut self, fields: &[&'static str]) -> Self {
        self.unique = fields.to_vec();
        self
    }

    /// Store a row directly, bypassing constraints
    pub fn seed(&self, row: Value) {
        if let Value::Object(record) = row {
            self.rows.lock().unwrap().push(record);
        }
    }

    pub fn race_next_insert(&self, row: Value) {
        if let Value::Object(record) = row {
            *self.racer.lock().unwrap() = Some(record);
        }
    }

    /// Queue a failure returned by the next persist/remove calls
    pub fn fail_next_write(&self, err: DatastoreError) {
        self.failures.lock().unwrap().push(err);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn find_count(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn tick(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn take_failure(&self) -> Option<DatastoreError> {
        let mut failures = self.failures.lock().unwrap();
        if failures.is_empty() {
            None
        } else {
            Some(failures.remove(0))
        }
    }

    fn select(&self, criteria: &Criteria, options: &QueryOptions) -> Result<Vec<Record>, DatastoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        for field in criteria.fields() {
            if !E::has_field(field) {
                return Err(DatastoreError::unknown_property(E::TABLE, field));
            }
        }
        if !E::has_field(&options.order.field) {
            return Err(DatastoreError::raw(format!(
                "no such column: {}",
                options.order.field
            )));
        }

        let mut rows: Vec<Record> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| matches(row, criteria))
            .cloned()
            .collect();

        let field = options.order.field.as_str();
        rows.sort_by(|a, b| {
            let ord = compare(a.get(field), b.get(field));
            match options.order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
        Ok(rows)
    }

    fn check_unique(&self, rows: &[Record], record: &Record) -> Result<(), DatastoreError> {
        for field in &self.unique {
            let value = match record.get(*field) {
                Some(Value::Null) | None => continue,
                Some(value) => value,
            };
            let taken = rows
                .iter()
                .any(|row| row.get(ID_FIELD) != record.get(ID_FIELD) && row.get(*field) == Some(value));
            if taken {
                let shown = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                return Err(DatastoreError::raw(format!(
                    "Duplicate entry '{}' for key '{}_{}_unique'",
                    shown,
                    E::TABLE,
                    field
                )));
            }
        }
        Ok(())
    }
}

fn matches(row: &Record, criteria: &Criteria) -> bool {
    criteria.iter().all(|(field, expected)| {
        let actual = row.get(field).unwrap_or(&Value::Null);
        match expected {
            Value::Array(values) => values.contains(actual),
            Value::Object(relation) if relation.contains_key(ID_FIELD) => {
                Some(actual) == relation.get(ID_FIELD)
            }
            _ => actual == expected,
        }
    })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (a, b) => a.map(Value::to_string).cmp(&b.map(Value::to_string)),
    }
}

fn decode<E: Entity>(rows: Vec<Record>) -> Result<Vec<E>, DatastoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(|e| DatastoreError::raw(e.to_string())))
        .collect()
}

#[async_trait]
impl<E: Entity> RepositoryAdapter<E> for MemoryRepository<E> {
    async fn find(&self, criteria: &Criteria, options: &QueryOptions) -> Result<Vec<E>, DatastoreError> {
        let rows = self.select(criteria, options)?;
        let offset = options.offset.unwrap_or(0) as usize;
        let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        decode(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_and_count(
        &self,
        criteria: &Criteria,
        options: &QueryOptions,
    ) -> Result<(Vec<E>, u64), DatastoreError> {
        let rows = self.select(criteria, options)?;
        let count = rows.len() as u64;
        let offset = options.offset.unwrap_or(0) as usize;
        let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok((decode(rows.into_iter().skip(offset).take(limit).collect())?, count))
    }

    fn create(&self, data: &Record) -> Result<E, DatastoreError> {
        let mut record = data.clone();
        if !record.contains_key(ID_FIELD) {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            record.insert(ID_FIELD.to_string(), Value::from(format!("id-{n}")));
        }
        let now = self.tick();
        for field in E::DERIVED_FIELDS {
            if E::has_field(field) {
                record.entry(field.to_string()).or_insert(Value::from(now));
            }
        }
        serde_json::from_value(Value::Object(record)).map_err(|e| DatastoreError::raw(e.to_string()))
    }

    async fn persist(&self, entity: &E) -> Result<(), DatastoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }

        let mut record = match serde_json::to_value(entity) {
            Ok(Value::Object(record)) => record,
            _ => return Err(DatastoreError::raw("entity is not a record")),
        };

        let mut rows = self.rows.lock().unwrap();
        let position = rows.iter().position(|row| row.get(ID_FIELD) == record.get(ID_FIELD));
        match position {
            Some(index) => {
                if E::has_field("updated") {
                    record.insert("updated".to_string(), Value::from(self.tick()));
                }
                self.check_unique(&rows, &record)?;
                rows[index] = record;
            }
            None => {
                if let Some(racer) = self.racer.lock().unwrap().take() {
                    rows.push(racer);
                }
                self.check_unique(&rows, &record)?;
                rows.push(record);
            }
        }
        Ok(())
    }

    async fn remove(&self, entity: &E) -> Result<(), DatastoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let id = Value::from(entity.id().clone());
        self.rows
            .lock()
            .unwrap()
            .retain(|row| row.get(ID_FIELD) != Some(&id));
        Ok(())
    }
}
