//! Timetable engine HTTP server binary.
//!
//! Initializes the repository, wires the engine services into the application
//! state, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin timetable-server --features "local-repo,http-server"
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `REPOSITORY_TYPE`: Storage backend (default: local)
//! - `TIMETABLE_CONFIG`: Optional TOML config file path
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use timetable_engine::db::config::ServerConfig;
use timetable_engine::db::factory::RepositoryFactory;
use timetable_engine::db::local::{InMemoryAffiliations, InMemoryQuotas};
use timetable_engine::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting timetable engine HTTP server");

    let config = ServerConfig::load().map_err(|e| anyhow::anyhow!(e))?;
    let repository = RepositoryFactory::create(config.repository);
    info!("Repository initialized ({:?})", config.repository);

    // The quota and affiliation systems are external collaborators; until a
    // live integration is configured the server runs with empty fixtures.
    let quotas = Arc::new(InMemoryQuotas::new());
    let affiliations = Arc::new(InMemoryAffiliations::new());

    let state = AppState::new(repository, quotas, affiliations);
    let app = create_router(state);

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
