use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use notif_core::credentials::ProviderCredentials;
use notif_core::dkim::KeyResolver;
use notif_core::dns::HickoryTxtLookup;
use notif_core::signature::SignatureVerifier;
use notif_db::{PgStore, Store};
use notif_dispatch::{DispatchEngine, DispatchQueue, TwilioChannel, WorkerPool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notif_api::config::ServerConfig;
use notif_api::ingest::IngestService;
use notif_api::router::build_app_router;
use notif_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // LOG_FORMAT=json switches to one JSON object per line.
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "notif_api=debug,notif_dispatch=debug,notif_core=info,tower_http=debug".into()
            }),
        )
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = notif_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    notif_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    notif_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    // --- Site defaults ---
    let site_credentials = match store
        .load_site_info()
        .await
        .expect("Failed to load site info")
    {
        Some(info) => info.credentials(),
        None => {
            tracing::warn!("No site info row, provider defaults are empty");
            ProviderCredentials::default()
        }
    };

    // --- Signature verification ---
    let lookup = HickoryTxtLookup::from_system_conf().expect("Failed to build DNS resolver");
    let verifier = SignatureVerifier::new(KeyResolver::new(Arc::new(lookup)));

    // --- Dispatch ---
    let channel = TwilioChannel::new(config.twilio_api_base.clone())
        .expect("Failed to build provider HTTP client");
    let engine = Arc::new(DispatchEngine::new(
        Arc::clone(&store),
        Arc::new(channel),
        site_credentials,
    ));
    let (queue, receiver) = DispatchQueue::bounded(config.dispatch_queue_capacity);
    let workers = WorkerPool::spawn(engine, receiver, config.dispatch_workers);
    tracing::info!(
        workers = workers.len(),
        capacity = config.dispatch_queue_capacity,
        "Dispatch workers started"
    );

    // --- App state ---
    let state = AppState {
        store: Arc::clone(&store),
        config: Arc::new(config.clone()),
        ingest: IngestService::new(store, verifier, queue),
    };

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

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    // The router (and with it the last queue handle) is gone, so the
    // workers finish what is queued and exit.
    tracing::info!("Server stopped accepting connections, draining dispatch queue");

    let drained = workers
        .join(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    if drained {
        tracing::info!("Graceful shutdown complete");
    } else {
        tracing::warn!("Shutdown finished with undelivered notifications");
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
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
