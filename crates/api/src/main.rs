use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use oragate_core::backend::ProcedureInvoker;
use oragate_core::store::{JobStore, QueryLogStore};
use oragate_oracle::{OracleConfig, OracleInvoker};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oragate_api::background;
use oragate_api::config::ServerConfig;
use oragate_api::jobs::JobRegistry;
use oragate_api::router::build_app_router;
use oragate_api::state::AppState;

#[tokio::main]
async fn main() {
    match std::env::var("ENV_FILE") {
        Ok(path) => {
            dotenvy::from_filename(path).ok();
        }
        Err(_) => {
            dotenvy::dotenv().ok();
        }
    }

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oragate_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    if config.auth.disabled {
        tracing::warn!("API_NO_AUTH=1: authentication is disabled");
    } else if config.auth.token.is_none() {
        tracing::warn!("API_TOKEN is not set: every authenticated request will be rejected");
    }

    let oracle_config = OracleConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid Oracle configuration");
        std::process::exit(1);
    });

    // --- Oracle backend ---
    let pool_config = oracle_config.clone();
    let oracle_pool = tokio::task::spawn_blocking(move || oragate_oracle::create_pool(&pool_config))
        .await
        .expect("Oracle pool task panicked")
        .expect("Failed to create Oracle session pool");
    tracing::info!(
        connect = %oracle_config.connect_string(),
        max = oracle_config.pool_max,
        min = oracle_config.pool_min,
        "Oracle session pool created"
    );

    let invoker: Arc<dyn ProcedureInvoker> = Arc::new(OracleInvoker::new(oracle_pool));
    invoker.ping().await.expect("Oracle ping failed");
    tracing::info!("Oracle ping passed");

    // --- Persistent mirror (optional) ---
    let store = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = oragate_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            oragate_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            oragate_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Some(Arc::new(oragate_db::PgStore::new(pool)))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set: jobs are kept in memory only");
            None
        }
    };

    // --- Job registry ---
    let job_store = store.clone().map(|s| s as Arc<dyn JobStore>);
    let query_log = store.map(|s| s as Arc<dyn QueryLogStore>);
    let registry = Arc::new(JobRegistry::new(job_store));
    match registry.rehydrate().await {
        Ok(restored) => tracing::info!(restored, "Job registry rehydrated"),
        Err(e) => tracing::warn!(error = %e, "Job rehydration failed, starting empty"),
    }

    // --- Retention sweeper ---
    let sweeper_cancel = CancellationToken::new();
    let sweeper_handle = tokio::spawn(background::job_retention::run(
        Arc::clone(&registry),
        config.job_retention_hours,
        Duration::from_secs(config.job_sweep_interval_secs),
        sweeper_cancel.clone(),
    ));

    // --- App state & router ---
    let state = AppState::new(config.clone(), invoker, registry, query_log);
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let shutdown = CancellationToken::new();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    })
    .into_future();

    let drain_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    tokio::select! {
        result = server => result.expect("Server error"),
        () = async {
            shutdown.cancelled().await;
            tokio::time::sleep(drain_timeout).await;
        } => {
            tracing::warn!(
                timeout_secs = drain_timeout.as_secs(),
                "In-flight requests did not drain in time, closing"
            );
        }
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweeper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    tracing::info!("Job retention sweeper stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
