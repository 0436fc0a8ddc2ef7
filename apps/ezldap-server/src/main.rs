//! ezldap HTTP server.
//!
//! Wires the LDAP connector, the resolution engine, the optional lookup
//! cache and the REST router, then serves until SIGINT/SIGTERM.

mod config;
mod logging;

use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};

use ezldap_api::api_router;
use ezldap_cache::CachingDirectoryService;
use ezldap_connector_ldap::LdapDirectory;
use ezldap_core::{DirectoryService, LdapService};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    logging::init_logging(config.log_format, &config.log_filter);

    info!(
        listen_addr = %config.listen_addr,
        api_path = %config.api_path,
        ldap = ?config.ldap,
        cache = ?config.cache,
        cors = ?config.cors,
        "Starting ezldap server"
    );

    let directory = LdapDirectory::new(config.ldap.clone()).unwrap_or_else(|e| {
        tracing::error!("Invalid LDAP configuration: {e}");
        std::process::exit(1);
    });

    // The connection is re-established on demand, so an unreachable
    // directory at startup is not fatal.
    if let Err(e) = directory.test_connection().await {
        warn!(error = %e, "LDAP connection test failed");
    }

    let engine = LdapService::new(
        Arc::new(directory),
        &config.ldap.user_search_base,
        &config.ldap.ou_search_base,
    );
    let service: Arc<dyn DirectoryService> = match config.cache {
        Some(cache) => Arc::new(CachingDirectoryService::new(engine, cache)),
        None => Arc::new(engine),
    };

    let app = api_router(&config.api_path, service, &config.cors);

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {e}", config.listen_addr);
            std::process::exit(1);
        }
    };

    info!(listen_addr = %config.listen_addr, "Server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
