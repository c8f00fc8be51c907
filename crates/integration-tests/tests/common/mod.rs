//! Shared fixture: a file-backed SQLite database with customers and orders
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tabula_core::domain::{Entity, EntityId, Field, Record, UniqueKey};
use tabula_core::port::id_provider::UuidProvider;
use tabula_core::port::time_provider::FixedTimeProvider;
use tabula_core::{CrudService, ServiceOptions};
use tabula_infra_sqlite::{create_pool, execute_script, SqliteConfig, SqliteRepository};
use tempfile::TempDir;

pub const SCHEMA: &str = r#"
CREATE TABLE customers (
    id TEXT PRIMARY KEY,
    created INTEGER NOT NULL,
    updated INTEGER NOT NULL,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL DEFAULT '',
    tier INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE orders (
    id TEXT PRIMARY KEY,
    created INTEGER NOT NULL,
    updated INTEGER NOT NULL,
    reference TEXT NOT NULL UNIQUE,
    customer TEXT NOT NULL REFERENCES customers(id),
    total REAL NOT NULL DEFAULT 0
);
"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub id: EntityId,
    pub created: i64,
    pub updated: i64,
    pub email: String,
    pub name: String,
    pub tier: i64,
}

impl Entity for Customer {
    const TABLE: &'static str = "customers";
    const FIELDS: &'static [Field] = &[
        Field::text("id"),
        Field::integer("created"),
        Field::integer("updated"),
        Field::text("email"),
        Field::text("name"),
        Field::integer("tier"),
    ];

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: EntityId,
    pub created: i64,
    pub updated: i64,
    pub reference: String,
    pub customer: EntityId,
    pub total: f64,
}

impl Entity for Order {
    const TABLE: &'static str = "orders";
    const FIELDS: &'static [Field] = &[
        Field::text("id"),
        Field::integer("created"),
        Field::integer("updated"),
        Field::text("reference"),
        Field::text("customer"),
        Field::real("total"),
    ];

    fn id(&self) -> &EntityId {
        &self.id
    }
}

pub struct Harness {
    pub customers: Arc<CrudService<Customer>>,
    pub orders: Arc<CrudService<Order>>,
    pub clock: Arc<FixedTimeProvider>,
    // Keeps the database file alive
    _dir: TempDir,
}

/// Fresh on-disk database; customers merge on `email`, orders on `reference`
pub async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = SqliteConfig::for_path(&dir.path().join("tabula.db")).with_max_connections(8);
    let pool = create_pool(&config).await.unwrap();
    execute_script(&pool, SCHEMA).await.unwrap();

    let ids = Arc::new(UuidProvider);
    let clock = Arc::new(FixedTimeProvider::new(1_000));

    let customers = CrudService::<Customer>::new(
        Arc::new(SqliteRepository::<Customer>::new(
            pool.clone(),
            ids.clone(),
            clock.clone(),
        )),
        ServiceOptions::default().with_unique_key(UniqueKey::new(["email"]).unwrap()),
    );
    let orders = CrudService::<Order>::new(
        Arc::new(SqliteRepository::<Order>::new(pool, ids, clock.clone())),
        ServiceOptions::default().with_unique_key(UniqueKey::new(["reference"]).unwrap()),
    );

    Harness {
        customers: Arc::new(customers),
        orders: Arc::new(orders),
        clock,
        _dir: dir,
    }
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}
