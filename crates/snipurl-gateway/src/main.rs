mod cli;

use crate::cli::{LogFormatArg, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use snipurl_core::{Dumper, NoopDumper, UrlStore};
use snipurl_gateway::{App, AppState};
use snipurl_hasher::Md5Hasher;
use snipurl_snipper::SnipperService;
use snipurl_storage::{FileDumper, InMemoryStore, PostgresConfig, PostgresStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format)?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        "starting snipurl"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            let store = InMemoryStore::new();
            match &config.file_storage_path {
                Some(path) => {
                    let dumper = FileDumper::open(path)
                        .await
                        .with_context(|| format!("failed to open dump {}", path.display()))?;
                    store
                        .restore(&dumper)
                        .await
                        .context("failed to restore from dump")?;
                    run(&config, store, dumper).await?;
                }
                None => run(&config, store, NoopDumper).await?,
            }
        }
        StorageBackendArg::Postgres => {
            let dsn = config
                .database_dsn
                .clone()
                .context("database dsn is required when storage backend is postgres")?;
            if config.file_storage_path.is_some() {
                warn!("file storage path is ignored with the postgres backend");
            }

            let store = PostgresStore::connect(&PostgresConfig::builder().dsn(dsn).build())
                .await
                .context("failed to connect to postgres")?;
            store.migrate().await.context("failed to apply schema")?;
            let pool = store.clone();
            run(&config, store, NoopDumper).await?;
            pool.close().await;
        }
    }

    info!("snipurl stopped");
    Ok(())
}

fn init_tracing(format: LogFormatArg) -> anyhow::Result<()> {
    tracing_log::LogTracer::init()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormatArg::Pretty => {
            tracing::subscriber::set_global_default(registry.with(tracing_subscriber::fmt::layer()))?
        }
        LogFormatArg::Json => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().json()),
        )?,
    }

    Ok(())
}

async fn run<S: UrlStore, D: Dumper>(config: &CLI, store: S, dumper: D) -> anyhow::Result<()> {
    let service = Arc::new(SnipperService::with_dumper(
        store,
        Md5Hasher::new(config.hash_length),
        dumper,
        config.snipper_settings(),
    ));
    let state = AppState::new(service.clone(), config.base_url.as_str())
        .with_trusted_subnet(config.trusted_subnet.clone());
    if state.trusted_subnet().is_none() {
        warn!("no trusted subnet configured, internal stats are closed");
    }

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "snipurl listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("http server stopped, draining delete queue");
    service.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
