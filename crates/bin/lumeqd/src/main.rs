//! # lumeqd — lumeq daemon
//!
//! Composition root that wires all adapters together and runs the workers.
//!
//! ## Responsibilities
//! - Load configuration (`lumeq.toml`, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the queue, button event, and directory adapters
//! - Construct one polling worker per configured vendor brand
//! - Construct the button resolver over the configured button map
//! - Run until SIGINT, then stop the workers
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use tracing_subscriber::EnvFilter;

use lumeq_adapter_govee::GoveeAdapter;
use lumeq_adapter_hue::HueAdapter;
use lumeq_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteButtonEventRepository, SqliteCommandQueue,
    SqliteDeviceDirectory, SqliteGroupDirectory,
};
use lumeq_app::services::{ButtonResolver, CommandProcessor, DispatchService};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    let stale_after = chrono::Duration::seconds(config.processor.stale_after_secs);
    let processor_config = config.processor.to_processor_config();
    let mut workers = Vec::new();

    // Vendor workers — one polling loop per configured brand, each over its
    // own queue handle (the pool itself is shared).
    if let Some(hue_config) = config.hue.clone() {
        let adapter = HueAdapter::new(hue_config)?;
        let queue = SqliteCommandQueue::new(pool.clone()).with_stale_after(stale_after);
        let processor =
            CommandProcessor::new(DispatchService::new(queue, adapter), processor_config.clone());
        tracing::info!("starting hue worker");
        workers.push(tokio::spawn(async move { processor.run().await }));
    }

    if let Some(govee_config) = config.govee.clone() {
        let adapter = GoveeAdapter::new(govee_config)?;
        let queue = SqliteCommandQueue::new(pool.clone()).with_stale_after(stale_after);
        let processor =
            CommandProcessor::new(DispatchService::new(queue, adapter), processor_config.clone());
        tracing::info!("starting govee worker");
        workers.push(tokio::spawn(async move { processor.run().await }));
    }

    if workers.is_empty() {
        tracing::warn!("no vendor configured, queued commands will not be dispatched");
    }

    // Button resolver
    let resolver = ButtonResolver::new(
        SqliteButtonEventRepository::new(pool.clone()),
        SqliteCommandQueue::new(pool.clone()).with_stale_after(stale_after),
        SqliteDeviceDirectory::new(pool.clone()),
        SqliteGroupDirectory::new(pool),
        config.button_map(),
    );
    let resolver_config = config.resolver.to_resolver_config();
    tracing::info!(bindings = config.buttons.len(), "starting button resolver");
    workers.push(tokio::spawn(async move {
        resolver.run(resolver_config).await;
    }));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, stopping workers");
    for worker in workers {
        worker.abort();
    }

    Ok(())
}
