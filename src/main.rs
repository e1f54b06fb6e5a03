//! students-api entry point.
//!
//! Run with:
//!   CONFIG_PATH=config/local.yaml cargo run
//!
//! Try:
//!   curl -X POST http://localhost:8082/api/students \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"Ann","email":"ann@x.com","age":21}'
//!   curl http://localhost:8082/api/students/1
//!   curl http://localhost:8082/api/students

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use students_api::api::{self, AppState};
use students_api::config::{Args, Config};
use students_api::storage::SqliteStore;
use students_api::validate::Validator;
use students_api::{Error, Server};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let (config, store, server) = match start(&args).await {
        Ok(v) => v,
        Err(e) => {
            error!("startup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let app = api::routes(AppState::new(store.clone(), Validator::new()));
    info!(address = %config.http_server.address, "server started");

    if let Err(e) = server.serve(app).await {
        error!("failed to shut down server: {e}");
    }
    if let Err(e) = store.close() {
        error!("failed to close storage: {e}");
    }

    info!("server shut down successfully");
    ExitCode::SUCCESS
}

/// Everything that must succeed before the first request is accepted.
async fn start(args: &Args) -> Result<(Config, Arc<SqliteStore>, Server), Error> {
    let config = Config::load(&args.config)?;

    let store = Arc::new(SqliteStore::open(&config.storage_path)?);
    info!(env = %config.env, version = env!("CARGO_PKG_VERSION"), "storage initialized");

    let server = Server::bind(&config.http_server.address).await?;
    Ok((config, store, server))
}
