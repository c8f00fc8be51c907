//! Tabula Demo - wires the CRUD service to SQLite and walks through
//! create / upsert / resert / paging / delete against a sample catalog

mod catalog;
mod config;
mod logging;

use anyhow::{Context, Result};
use catalog::{Customer, Order, SCHEMA};
use config::DemoConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tabula_core::domain::{Criteria, FindOptions, Record, UniqueKey};
use tabula_core::port::id_provider::UuidProvider;
use tabula_core::port::time_provider::SystemTimeProvider;
use tabula_core::{AppError, CrudService, ServiceOptions};
use tabula_infra_sqlite::{create_pool, execute_script, SqliteRepository};
use tracing::{info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration and initialize logging
    let config = DemoConfig::from_env();
    logging::init(config.log_format)?;

    info!("Tabula demo v{} starting...", VERSION);
    run(&config).await
}

/// Summary of one walkthrough
#[derive(Debug)]
struct Outcome {
    customer: Customer,
    blocked_delete: Option<AppError>,
    listed: u64,
}

async fn run(config: &DemoConfig) -> Result<()> {
    let outcome = walkthrough(config).await?;
    info!(
        customer = %outcome.customer.id,
        listed = outcome.listed,
        blocked = outcome.blocked_delete.is_some(),
        "Demo finished"
    );
    Ok(())
}

async fn walkthrough(config: &DemoConfig) -> Result<Outcome> {
    // 2. Initialize database
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    info!(db_path = %config.db_path.display(), "Initializing database...");

    let pool = create_pool(&config.sqlite())
        .await
        .context("DB pool creation failed")?;
    execute_script(&pool, SCHEMA)
        .await
        .context("Schema setup failed")?;

    // 3. Setup dependencies (DI wiring)
    let id_provider = Arc::new(UuidProvider);
    let time_provider = Arc::new(SystemTimeProvider);

    let customers = CrudService::<Customer>::new(
        Arc::new(SqliteRepository::<Customer>::new(
            pool.clone(),
            id_provider.clone(),
            time_provider.clone(),
        )),
        ServiceOptions::default().with_unique_key(key(&["email"])?),
    );
    let orders = CrudService::<Order>::new(
        Arc::new(SqliteRepository::<Order>::new(pool.clone(), id_provider, time_provider)),
        ServiceOptions::default().with_unique_key(key(&["reference"])?),
    );

    // 4. Merge by business key
    let customer = customers
        .upsert(record(json!({"email": "ann@example.com", "name": "Ann"})), None)
        .await?;
    let kept = customers
        .resert(record(json!({"email": "ann@example.com", "name": "Ignored"})), None)
        .await?;
    info!(id = %kept.id, name = %kept.name, "Resert kept the stored customer");

    let customer = customers
        .update(customer, &record(json!({"tier": 2})))
        .await?;

    let order = orders
        .upsert(
            record(json!({
                "reference": "ORD-1",
                "customer": customer.id,
                "total": 42.5,
                "lines": ["book", "pen"],
            })),
            None,
        )
        .await?;

    // 5. A referenced customer cannot be removed
    let blocked_delete = match customers.delete_by_id(&customer.id).await {
        Ok(_) => None,
        Err(err) => {
            warn!(reason = %err.reason(), error = %err, "Delete rejected");
            Some(err)
        }
    };

    // 6. Paged listing
    let page = customers
        .find_paged(&Criteria::new(), FindOptions::new().order("email:asc").limit(10))
        .await?;
    info!(count = page.count, order = %page.order, "Listed customers");

    // 7. Clean up in dependency order
    orders.remove(order).await?;
    let customer = customers.delete_by_id(&customer.id).await?;

    Ok(Outcome {
        customer,
        blocked_delete,
        listed: page.count,
    })
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(record) => record,
        _ => Record::new(),
    }
}

fn key(fields: &[&str]) -> Result<UniqueKey> {
    UniqueKey::new(fields.iter().copied()).context("unique key needs at least one field")
}
