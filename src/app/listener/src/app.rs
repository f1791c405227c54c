// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use claims::{ClaimDispatcher, StartOutcome};
use claims_adapter_webhook::WebhookClaimedRecordHandler;
use claims_postgres::{PostgresChangeFeed, PostgresClaimableRecordRepository};
use claims_services::{ClaimDispatcherImpl, ClaimDispatcherMetrics, LoggingClaimedRecordHandler};
use dill::{Catalog, CatalogBuilder};
use internal_error::{InternalError, ResultIntoInternal};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use time_source::SystemTimeSourceDefault;

use crate::{Cli, ListenerConfig, ListenerError};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn run(args: Cli) -> Result<(), ListenerError> {
    let config = ListenerConfig::load(&args.config)?;

    if !observability::init::logging(&config.logging_config()) {
        tracing::warn!("Logging was initialized earlier, configured level and format are ignored");
    }
    observability::panic_handler::set_hook_trace_panics(false);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %args.config.display(),
        collection = %config.dispatcher.collection,
        target_status = %config.dispatcher.target_status,
        dry_run = args.dry_run,
        "Starting claims listener"
    );

    let database_url =
        resolve_database_url(&args, &config).ok_or(ListenerError::MissingDatabaseUrl)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .connect(&database_url)
        .await
        .int_err()?;

    if args.migrate {
        tracing::info!("Applying database migrations");
        sqlx::migrate!("../../../migrations/postgres")
            .run(&pool)
            .await
            .int_err()?;
    }

    let catalog = configure_catalog(&config, pool, args.dry_run);

    let metrics_server = if config.metrics.enabled {
        Some(spawn_metrics_server(&catalog, &config).await?)
    } else {
        None
    };

    let dispatcher = catalog.get_one::<dyn ClaimDispatcher>().int_err()?;

    match dispatcher.start().await? {
        StartOutcome::Started => tracing::info!("Listening for record changes"),
        StartOutcome::AlreadyRunning => {}
    }

    wait_for_shutdown(dispatcher.as_ref()).await?;

    tracing::info!("Stopping claims listener");
    dispatcher.stop().await;

    if let Some(server) = metrics_server {
        server.abort();
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The command line wins over the config file
pub fn resolve_database_url(args: &Cli, config: &ListenerConfig) -> Option<String> {
    args.database_url
        .clone()
        .or_else(|| config.database.url.clone())
        .filter(|url| !url.is_empty())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn configure_catalog(
    config: &ListenerConfig,
    pool: PgPool,
    dry_run: bool,
) -> Catalog {
    let mut b = CatalogBuilder::new();

    b.add::<SystemTimeSourceDefault>();

    b.add_value(pool);
    b.add_value(config.postgres_claims_config());
    b.add::<PostgresClaimableRecordRepository>();
    b.add::<PostgresChangeFeed>();

    b.add_value(config.claim_dispatcher_config());
    b.add::<ClaimDispatcherMetrics>();
    b.add::<ClaimDispatcherImpl>();

    match config.handler.webhook_handler_config() {
        Some(webhook_config) if !dry_run => {
            b.add_value(webhook_config);
            b.add::<WebhookClaimedRecordHandler>();
        }
        _ => {
            b.add::<LoggingClaimedRecordHandler>();
        }
    }

    b.build()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

async fn spawn_metrics_server(
    catalog: &Catalog,
    config: &ListenerConfig,
) -> Result<tokio::task::JoinHandle<()>, InternalError> {
    let registry = observability::metrics::register_all(catalog).int_err()?;

    let app = axum::Router::new()
        .route(
            "/system/metrics",
            axum::routing::get(observability::metrics::metrics_handler),
        )
        .with_state(registry);

    let listener = tokio::net::TcpListener::bind(config.metrics.address)
        .await
        .int_err()?;

    tracing::info!(address = %config.metrics.address, "Serving metrics");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = ?e, error_msg = %e, "Metrics server failed");
        }
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

// Returns on Ctrl+C, or when the change feed ends on its own
async fn wait_for_shutdown(dispatcher: &dyn ClaimDispatcher) -> Result<(), InternalError> {
    let mut poll = tokio::time::interval(std::time::Duration::from_secs(1));

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.int_err()?;
                tracing::info!("Received shutdown signal");
                return Ok(());
            }
            _ = poll.tick() => {
                if !dispatcher.is_running().await {
                    tracing::warn!("Change feed ended");
                    return Ok(());
                }
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
