// Sample entities for the demo

use serde::{Deserialize, Serialize};
use tabula_core::domain::{Entity, EntityId, Field};

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    id TEXT PRIMARY KEY,
    created INTEGER NOT NULL,
    updated INTEGER NOT NULL,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL DEFAULT '',
    tier INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS orders (
    id TEXT PRIMARY KEY,
    created INTEGER NOT NULL,
    updated INTEGER NOT NULL,
    reference TEXT NOT NULL UNIQUE,
    customer TEXT NOT NULL REFERENCES customers(id),
    total REAL NOT NULL DEFAULT 0,
    lines TEXT
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
    /// Id of the owning customer
    pub customer: EntityId,
    pub total: f64,
    pub lines: Vec<String>,
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
        Field::json("lines"),
    ];

    fn id(&self) -> &EntityId {
        &self.id
    }
}
