//! # Server Entry Point
//!
//! ## Purpose
//! Parses configuration, wires the engine, and starts the REST transport.
//! Ingestion, crawling, and document extraction are out of scope here — the
//! corpus is expected to already be populated via the ingestion adapter
//! before this process starts; this binary only serves reads (and the
//! `clear_caches` control operation) over it.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Open storage, spawn the vector preload task, build the orchestrator
//! 4. Start the REST API server
//! 5. Handle shutdown signals gracefully

use clap::{Arg, Command};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use falu_legal_search::{api::ApiServer, config::Config, errors::SearchError, AppState, Engine, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("falu-legal-search")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Hybrid retrieval and ranking engine for Chinese statutory law")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("check-health")
                .long("check-health")
                .help("Run health checks and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = Config::from_file(config_path)?;

    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    init_logging(&config)?;

    info!("starting falu-legal-search");
    info!(path = %config_path, "configuration loaded");

    if matches.get_flag("check-health") {
        return run_health_check(config).await;
    }

    let engine = Engine::new(config.clone()).await?;
    let app_state = AppState { engine };

    let server = ApiServer::new(app_state.clone()).await?;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!(error = %e, "server error");
        }
    });

    info!(host = %config.server.host, port = config.server.port, "server started");

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        }
        _ = server_handle => {
            warn!("server task stopped unexpectedly");
        }
    }

    app_state.engine.storage().flush()?;
    info!("shut down successfully");

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let log_level = config
        .logging
        .level
        .parse()
        .map_err(|_| SearchError::Config {
            message: format!("invalid log level: {}", config.logging.level),
        })?;

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).with_level(true);

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(fmt_layer.json().with_filter(tracing_subscriber::filter::LevelFilter::from_level(log_level)))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt_layer.with_filter(tracing_subscriber::filter::LevelFilter::from_level(log_level)))
            .init();
    }

    Ok(())
}

/// Open storage and run the readiness preload's first pass, without binding
/// a port, so ops tooling can check the corpus is loadable before deploy.
async fn run_health_check(config: Config) -> Result<()> {
    info!("running health checks");
    let engine = Engine::new(config).await?;
    engine.storage().health_check()?;
    info!("storage round-trip OK");

    let ready = engine
        .orchestrator()
        .search_laws("健康检查", None, None, Some(1))
        .await;
    match ready {
        Ok(_) => info!("orchestrator responded"),
        Err(e) => warn!(error = %e, "orchestrator health probe degraded"),
    }

    info!("health checks passed");
    Ok(())
}
