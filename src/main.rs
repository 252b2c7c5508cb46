//! ==============================================================================
//! main.rs - pir hub entry point
//! ==============================================================================
//!
//! purpose:
//!     this is the hub that ESP sensor nodes push motion/vibration events to.
//!     it keeps the latest state per node in memory and serves a polling
//!     dashboard; nothing is persisted and a restart clears all counters.
//!
//! responsibilities:
//!     - load configuration (config/hub.toml + API_KEY/PORT env overrides)
//!     - construct the shared node store
//!     - serve the http surface (ingestion, json queries, dashboard)
//!
//! architecture:
//!
//!     ┌──────────┐  POST /pir_event   ┌─────────────────────────────┐
//!     │ ESP node │ ─────────────────> │        rust hub (this)      │
//!     └──────────┘   X-API-Key        │  ┌───────────────────────┐  │
//!                                     │  │      NodeStore        │  │
//!     ┌──────────┐  GET /live.json    │  │ node -> latest record │  │
//!     │ browser  │ <───────────────── │  └───────────────────────┘  │
//!     └──────────┘  GET /nodes.json   └─────────────────────────────┘
//!
//! relationships:
//!     - uses: config.rs (HubConfig), store.rs (NodeStore), server.rs (router)
//!
//! ==============================================================================

mod config;
mod domain;
mod server;
mod store;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::server::AppContext;
use crate::store::NodeStore;

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  PIR Hub - ESP Remote Motion Dashboard");
    println!("===========================================================");

    // step 1: load configuration
    let config = config::HubConfig::load_or_default();
    config.print_summary();

    // step 2: logging, filtered by the configured level (RUST_LOG still wins)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // step 3: the shared node store, the only mutable state in the process
    let ctx = AppContext {
        store: NodeStore::new(),
        api_key: config.auth.api_key.clone(),
    };

    // step 4: serve until killed
    let addr = format!("0.0.0.0:{}", config.server.port);
    println!("[STARTUP] ✓ Dashboard live at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, server::router(ctx)).await?;
    Ok(())
}
